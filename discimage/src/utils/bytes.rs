//! Fixed-offset field extraction
//!
//! On-disk records are decoded straight from sector buffers. Callers check
//! record bounds first; these helpers read zero for bytes past the slice end
//! so a truncated record never panics.

fn field<const N: usize>(data: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    if let Some(src) = data.get(offset..) {
        let n = src.len().min(N);
        out[..n].copy_from_slice(&src[..n]);
    }
    out
}

/// Single byte at `offset`
pub fn u8_at(data: &[u8], offset: usize) -> u8 {
    data.get(offset).copied().unwrap_or(0)
}

/// Little-endian u16 at `offset`
pub fn le_u16(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(field(data, offset))
}

/// Little-endian u32 at `offset`
pub fn le_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(field(data, offset))
}

/// Little-endian u64 at `offset`
pub fn le_u64(data: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(field(data, offset))
}

/// Big-endian u32 at `offset`
pub fn be_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes(field(data, offset))
}

/// ECMA-119 both-endian u32 (LE copy then BE copy), read from the LE half
pub fn both_u32(data: &[u8], offset: usize) -> u32 {
    le_u32(data, offset)
}

/// ECMA-119 both-endian u16 (LE copy then BE copy), read from the LE half
pub fn both_u16(data: &[u8], offset: usize) -> u16 {
    le_u16(data, offset)
}

/// Sub-slice `[offset, offset + len)`, clamped to the data
pub fn slice(data: &[u8], offset: usize, len: usize) -> &[u8] {
    let start = offset.min(data.len());
    let end = offset.saturating_add(len).min(data.len());
    &data[start..end]
}
