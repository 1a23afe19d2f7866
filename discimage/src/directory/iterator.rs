//! Directory iteration
//!
//! Iterator for reading directory records sequentially. A directory extent
//! is read one sector at a time and records are parsed from offset 0 of
//! each sector; a record never spans two sectors.

use crate::directory::record::DirectoryRecord;
use crate::error::Result;
use crate::file::extent::Extent;
use crate::source::ImageSource;
use crate::types::SECTOR_SIZE;
use tracing::{trace, warn};

/// Outcome of looking at one offset inside a directory sector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectorStep {
    /// A complete record starts here
    Record(DirectoryRecord),

    /// No more records in this sector
    ///
    /// `clean` is true when the rest of the sector is zero padding (or the
    /// sector was consumed exactly); false when a non-zero byte follows a
    /// zero length byte or a record overruns the sector.
    End {
        /// Sector ended on padding
        clean: bool,
    },
}

/// Decode the record at `offset` of a directory sector
pub fn next_in_sector(sector: &[u8], offset: usize) -> SectorStep {
    let Some(&length) = sector.get(offset) else {
        return SectorStep::End { clean: true };
    };
    if length == 0 {
        return SectorStep::End {
            clean: sector[offset..].iter().all(|&b| b == 0),
        };
    }
    match DirectoryRecord::parse(&sector[offset..]) {
        Some(record) => SectorStep::Record(record),
        None => SectorStep::End { clean: false },
    }
}

/// Directory iterator
///
/// Yields every record of an extent, "." and ".." included. Unclean sector
/// endings are not errors: the iterator moves on to the next sector and
/// [`DirectoryIterator::is_clean`] turns false.
pub struct DirectoryIterator<'a, S: ImageSource + ?Sized> {
    source: &'a mut S,
    extent: Extent,
    sector_index: u64,
    offset: usize,
    current_sector: Box<[u8; SECTOR_SIZE]>,
    loaded: bool,
    clean: bool,
    failed: bool,
}

impl<'a, S: ImageSource + ?Sized> DirectoryIterator<'a, S> {
    /// Create new directory iterator
    pub fn new(source: &'a mut S, extent: Extent) -> Self {
        Self {
            source,
            extent,
            sector_index: 0,
            offset: 0,
            current_sector: Box::new([0u8; SECTOR_SIZE]),
            loaded: false,
            clean: true,
            failed: false,
        }
    }

    /// Whether every sector so far ended cleanly
    pub fn is_clean(&self) -> bool {
        self.clean
    }
}

impl<'a, S: ImageSource + ?Sized> Iterator for DirectoryIterator<'a, S> {
    type Item = Result<DirectoryRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed || self.sector_index >= self.extent.sector_count() {
                return None;
            }

            let sector = self.extent.sector + self.sector_index;
            if !self.loaded {
                if let Err(e) = self.source.read_sector(sector, self.current_sector.as_mut()) {
                    self.failed = true;
                    return Some(Err(e));
                }
                self.loaded = true;
                self.offset = 0;
            }

            match next_in_sector(self.current_sector.as_slice(), self.offset) {
                SectorStep::Record(record) => {
                    self.offset += record.length as usize;
                    trace!(sector, name = %record.name(), "directory record");
                    return Some(Ok(record));
                }
                SectorStep::End { clean } => {
                    if !clean {
                        warn!(sector, offset = self.offset, "directory sector ended uncleanly");
                        self.clean = false;
                    }
                    self.sector_index += 1;
                    self.loaded = false;
                }
            }
        }
    }
}

/// All records of one directory extent
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    /// Records in on-disk order, "." and ".." included
    pub records: Vec<DirectoryRecord>,

    /// Every sector ended on zero padding
    pub clean_finish: bool,
}

/// Read a whole directory extent
pub fn read_directory<S: ImageSource + ?Sized>(
    source: &mut S,
    extent: Extent,
) -> Result<DirectoryListing> {
    let mut iter = DirectoryIterator::new(source, extent);
    let mut records = Vec::new();
    for record in iter.by_ref() {
        records.push(record?);
    }
    Ok(DirectoryListing {
        records,
        clean_finish: iter.is_clean(),
    })
}
