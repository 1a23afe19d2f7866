//! String handling utilities
//!
//! ISO9660 stores names as d-/a-characters or, on Joliet tables, UCS-2
//! big-endian. UDF uses "dstrings": a compression id byte followed by
//! 8-bit or 16-bit big-endian code units.

/// UDF dstring compression id for 8-bit code units
pub const DSTRING_8BIT: u8 = 8;

/// UDF dstring compression id for 16-bit code units
pub const DSTRING_16BIT: u8 = 16;

/// Decode a directory record identifier
///
/// Identifiers containing a zero byte are UCS-2/UTF-16 big-endian (Joliet);
/// everything else is read as UTF-8, replacing invalid sequences.
pub fn decode_identifier(raw: &[u8]) -> String {
    if raw.contains(&0) {
        decode_utf16_be(raw)
    } else {
        String::from_utf8_lossy(raw).into_owned()
    }
}

/// Decode a space-padded descriptor text field (system/volume identifier)
pub fn decode_padded(raw: &[u8], ucs2: bool) -> String {
    let text = if ucs2 {
        decode_utf16_be(raw)
    } else {
        String::from_utf8_lossy(raw).into_owned()
    };
    text.trim_end_matches(&[' ', '\0'][..]).to_string()
}

/// Decode UTF-16 big-endian code units, ignoring a dangling odd byte
pub fn decode_utf16_be(raw: &[u8]) -> String {
    let units = raw
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Strip version suffix from filename (e.g., "FILE.TXT;1" -> "FILE.TXT")
pub fn strip_version(name: &str) -> &str {
    match name.split_once(';') {
        Some((base, _)) => base,
        None => name,
    }
}

/// Decode a UDF dstring payload (compression id byte + code units)
///
/// Trailing zero padding is trimmed: zero bytes for 8-bit strings, zero
/// code units for 16-bit strings. Unknown compression ids decode to an
/// empty string.
pub fn decode_dstring(raw: &[u8]) -> String {
    let Some((&compression, body)) = raw.split_first() else {
        return String::new();
    };

    match compression {
        DSTRING_8BIT => {
            let mut end = body.len();
            while end > 0 && body[end - 1] == 0 {
                end -= 1;
            }
            let body = &body[..end];
            match core::str::from_utf8(body) {
                Ok(s) => s.to_string(),
                // OSTA CS0 8-bit is Latin-1 when it is not UTF-8
                Err(_) => body.iter().map(|&b| b as char).collect(),
            }
        }
        DSTRING_16BIT => {
            let mut units: Vec<u16> = body
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            while units.last() == Some(&0) {
                units.pop();
            }
            char::decode_utf16(units)
                .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect()
        }
        _ => String::new(),
    }
}

/// Decode a fixed-size UDF dstring field whose last byte holds the used length
pub fn decode_fixed_dstring(field: &[u8]) -> String {
    let Some((&used, body)) = field.split_last() else {
        return String::new();
    };
    let used = used as usize;
    if used == 0 {
        return String::new();
    }
    if used <= body.len() {
        decode_dstring(&body[..used])
    } else {
        decode_dstring(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_utf8() {
        assert_eq!(decode_identifier(b"FILE.TXT;1"), "FILE.TXT;1");
    }

    #[test]
    fn test_identifier_utf16_when_zero_byte_present() {
        let raw = [0x00, b'a', 0x00, b'b', 0x00, b'c'];
        assert_eq!(decode_identifier(&raw), "abc");
    }

    #[test]
    fn test_strip_version() {
        assert_eq!(strip_version("FILE.TXT;1"), "FILE.TXT");
        assert_eq!(strip_version("README"), "README");
        assert_eq!(strip_version("A;B;2"), "A");
    }

    #[test]
    fn test_decode_padded() {
        assert_eq!(decode_padded(b"TEST VOLUME     ", false), "TEST VOLUME");
        let ucs2 = [0x00, b'C', 0x00, b'D', 0x00, b' ', 0x00, b' '];
        assert_eq!(decode_padded(&ucs2, true), "CD");
    }

    #[test]
    fn test_dstring_8bit() {
        assert_eq!(decode_dstring(b"\x08LONG\0\0"), "LONG");
        // 0xE9 alone is not UTF-8, falls back to Latin-1
        assert_eq!(decode_dstring(&[8, b'c', b'a', b'f', 0xE9]), "caf\u{e9}");
    }

    #[test]
    fn test_dstring_16bit() {
        let raw = [16, 0x00, b'h', 0x00, b'i', 0x00, 0x00];
        assert_eq!(decode_dstring(&raw), "hi");
    }

    #[test]
    fn test_dstring_unknown_or_empty() {
        assert_eq!(decode_dstring(&[]), "");
        assert_eq!(decode_dstring(&[254, b'x']), "");
    }

    #[test]
    fn test_fixed_dstring_uses_length_byte() {
        let mut field = [0u8; 32];
        field[0] = 8;
        field[1..5].copy_from_slice(b"DISC");
        field[31] = 5;
        assert_eq!(decode_fixed_dstring(&field), "DISC");
    }
}
