//! Sector alignment and calculation utilities

use crate::types::SECTOR_SIZE;

/// Convert sector number to byte offset
pub fn sector_to_byte(sector: u64) -> u64 {
    sector * SECTOR_SIZE as u64
}

/// Calculate number of sectors needed for byte count
pub fn sectors_for_bytes(byte_count: u64) -> u64 {
    byte_count.div_ceil(SECTOR_SIZE as u64)
}
