//! Supplementary Volume Descriptor (Joliet support)
//!
//! The Supplementary VD enables Joliet extensions for long Unicode filenames.
//! Joliet is announced through the escape sequences field at offset 88.

/// Joliet escape sequences and the level each one announces
const JOLIET_ESCAPES: [(&[u8; 3], u8); 3] = [(b"%/@", 1), (b"%/C", 2), (b"%/E", 3)];

/// Joliet level announced by the escape sequences field, if any
///
/// `%/@`, `%/C` and `%/E` mark UCS-2 levels 1, 2 and 3.
pub fn joliet_level(escapes: &[u8]) -> Option<u8> {
    escapes.windows(3).find_map(|window| {
        JOLIET_ESCAPES
            .iter()
            .find(|(seq, _)| window == seq.as_slice())
            .map(|(_, level)| *level)
    })
}
