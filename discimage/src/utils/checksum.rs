//! Checksum calculations for validation

/// UDF descriptor tag checksum
///
/// Byte sum modulo 256 of the 16-byte tag, skipping byte 4 (the checksum
/// field itself).
pub fn tag_checksum(tag: &[u8]) -> u8 {
    tag.iter()
        .take(16)
        .enumerate()
        .filter(|(i, _)| *i != 4)
        .fold(0u8, |sum, (_, b)| sum.wrapping_add(*b))
}

/// Verify the checksum stored at byte 4 of a UDF tag
pub fn verify_tag_checksum(tag: &[u8]) -> bool {
    tag.len() >= 16 && tag_checksum(tag) == tag[4]
}
