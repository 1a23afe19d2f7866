//! File extent management
//!
//! Extents represent contiguous data regions on disk.

use crate::types::SECTOR_SIZE;

/// Contiguous run of sectors: starting sector plus length in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Extent {
    /// Starting logical sector
    pub sector: u64,

    /// Length in bytes
    pub length: u64,
}

impl Extent {
    /// Create new extent
    pub fn new(sector: u64, length: u64) -> Self {
        Self { sector, length }
    }

    /// Number of sectors (2048 bytes each)
    pub fn sector_count(&self) -> u64 {
        self.length.div_ceil(SECTOR_SIZE as u64)
    }

    /// End sector (exclusive)
    pub fn end_sector(&self) -> u64 {
        self.sector + self.sector_count()
    }

    /// Absolute byte offset of the first byte
    pub fn byte_offset(&self) -> u64 {
        self.sector * SECTOR_SIZE as u64
    }
}
