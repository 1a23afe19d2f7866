//! UDF descriptor tags (ECMA-167 3/7.2)
//!
//! Every UDF structure starts with a 16-byte tag naming its type and the
//! sector it was written for.

use crate::error::{Error, Result};
use crate::source::ImageSource;
use crate::types::SECTOR_SIZE;
use crate::utils::{bytes, checksum, sector::sector_to_byte};
use std::io;

/// 16-byte descriptor tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tag {
    /// Tag identifier (descriptor type)
    pub identifier: u16,

    /// Descriptor version (2 or 3)
    pub version: u16,

    /// Stored tag checksum
    pub checksum: u8,

    /// Tag serial number
    pub serial: u16,

    /// CRC of the descriptor body
    pub crc: u16,

    /// Length of the descriptor body covered by the CRC
    pub crc_length: u16,

    /// Sector the descriptor claims to live at
    pub location: u32,
}

impl Tag {
    /// Tag length in bytes
    pub const LENGTH: usize = 16;

    /// Primary Volume Descriptor
    pub const PRIMARY_VOLUME: u16 = 1;
    /// Anchor Volume Descriptor Pointer
    pub const ANCHOR_POINTER: u16 = 2;
    /// Volume Descriptor Pointer
    pub const VOLUME_POINTER: u16 = 3;
    /// Implementation Use Volume Descriptor
    pub const IMPLEMENTATION_USE: u16 = 4;
    /// Partition Descriptor
    pub const PARTITION: u16 = 5;
    /// Logical Volume Descriptor
    pub const LOGICAL_VOLUME: u16 = 6;
    /// Unallocated Space Descriptor
    pub const UNALLOCATED_SPACE: u16 = 7;
    /// Terminating Descriptor
    pub const TERMINATING: u16 = 8;
    /// Logical Volume Integrity Descriptor
    pub const LOGICAL_VOLUME_INTEGRITY: u16 = 9;
    /// File Set Descriptor
    pub const FILE_SET: u16 = 256;
    /// File Identifier Descriptor
    pub const FILE_IDENTIFIER: u16 = 257;
    /// File Entry
    pub const FILE_ENTRY: u16 = 261;
    /// Extended File Entry
    pub const EXTENDED_FILE_ENTRY: u16 = 266;

    /// Decode the tag at the start of `raw`
    pub fn parse(raw: &[u8]) -> Self {
        Self {
            identifier: bytes::le_u16(raw, 0),
            version: bytes::le_u16(raw, 2),
            checksum: bytes::u8_at(raw, 4),
            serial: bytes::le_u16(raw, 6),
            crc: bytes::le_u16(raw, 8),
            crc_length: bytes::le_u16(raw, 10),
            location: bytes::le_u32(raw, 12),
        }
    }

    /// Checksum over the raw tag bytes matches the stored one
    pub fn checksum_ok(raw: &[u8]) -> bool {
        checksum::verify_tag_checksum(raw)
    }

    /// Tag is of `identifier`, checksums, and was written for `sector`
    pub fn is_valid_at(raw: &[u8], identifier: u16, sector: u64) -> bool {
        let tag = Self::parse(raw);
        tag.identifier == identifier && Self::checksum_ok(raw) && tag.location as u64 == sector
    }

    /// Total descriptor length implied by the tag
    pub fn descriptor_length(&self) -> usize {
        Self::LENGTH + self.crc_length as usize
    }
}

/// Read the tagged descriptor starting at `sector`
///
/// At least one full sector is returned when the image has it, more when
/// the tag's CRC length says the descriptor is longer. A descriptor cut off
/// by the end of the image is an I/O error.
pub fn read_descriptor<S: ImageSource + ?Sized>(source: &mut S, sector: u64) -> Result<(Tag, Vec<u8>)> {
    let offset = sector_to_byte(sector);

    let mut head = [0u8; Tag::LENGTH];
    source.read_exact_at(offset, &mut head)?;
    let tag = Tag::parse(&head);

    let wanted = tag.descriptor_length();
    let mut raw = vec![0u8; wanted.max(SECTOR_SIZE)];
    let read = source.read_at(offset, &mut raw)?;
    if read < wanted {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("descriptor at sector {sector} needs {wanted} bytes, image has {read}"),
        )));
    }
    raw.truncate(read);
    Ok((tag, raw))
}
