//! File Entry and Extended File Entry (ECMA-167 4/14.9, 4/14.17)

use crate::utils::bytes;
use crate::utils::datetime::UdfTimestamp;

/// Short allocation descriptor: extent relative to the partition (4/14.14.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllocationDescriptor {
    /// Length in bytes (extent type bits masked off)
    pub length: u32,

    /// Logical block number
    pub location: u32,
}

impl AllocationDescriptor {
    fn parse(raw: &[u8], offset: usize) -> Self {
        Self {
            length: bytes::le_u32(raw, offset) & 0x3FFF_FFFF,
            location: bytes::le_u32(raw, offset + 4),
        }
    }
}

/// Decoded (Extended) File Entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Read from an Extended File Entry
    pub extended: bool,

    /// ICB file type
    pub file_type: u8,

    /// ICB flags; the low three bits give the allocation descriptor form
    pub icb_flags: u16,

    /// Owner user id
    pub uid: u32,

    /// Owner group id
    pub gid: u32,

    /// Permission bits
    pub permissions: u32,

    /// Hard link count
    pub links: u16,

    /// File size in bytes as recorded in the entry
    pub information_length: u64,

    /// Modification time
    pub modified: UdfTimestamp,

    /// First allocation descriptor
    pub allocation: AllocationDescriptor,
}

impl FileEntry {
    /// ICB file type of a directory
    pub const DIRECTORY: u8 = 4;

    /// ICB file type of a regular (random-access) file
    pub const FILE: u8 = 5;

    /// Decode a File Entry, or an Extended File Entry when `extended` is set
    pub fn parse(raw: &[u8], extended: bool) -> Self {
        let (modified_at, ea_length_at, ad_length_at, fixed_length) = if extended {
            (92, 208, 212, 216)
        } else {
            (84, 168, 172, 176)
        };

        let ea_length = bytes::le_u32(raw, ea_length_at) as usize;
        let ad_length = bytes::le_u32(raw, ad_length_at) as usize;
        let allocation = if ad_length >= 8 {
            AllocationDescriptor::parse(raw, fixed_length + ea_length)
        } else {
            AllocationDescriptor::default()
        };

        Self {
            extended,
            file_type: bytes::u8_at(raw, 27),
            icb_flags: bytes::le_u16(raw, 34),
            uid: bytes::le_u32(raw, 36),
            gid: bytes::le_u32(raw, 40),
            permissions: bytes::le_u32(raw, 44),
            links: bytes::le_u16(raw, 48),
            information_length: bytes::le_u64(raw, 56),
            modified: UdfTimestamp::from_bytes(bytes::slice(raw, modified_at, 12)),
            allocation,
        }
    }

    /// Is this entry a directory?
    pub fn is_directory(&self) -> bool {
        self.file_type == Self::DIRECTORY
    }
}

/// UDF-specific node metadata
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UdfNode {
    /// ICB file type
    pub file_type: u8,

    /// Owner user id
    pub uid: u32,

    /// Owner group id
    pub gid: u32,

    /// Permission bits
    pub permissions: u32,

    /// Hard link count
    pub links: u16,

    /// Size recorded in the entry; the node size comes from the allocation
    pub information_length: u64,

    /// Modification time
    pub modified: UdfTimestamp,

    /// Partition reference the entry was reached through
    pub partition: u16,
}

impl UdfNode {
    pub(crate) fn from_entry(entry: &FileEntry, partition: u16) -> Self {
        Self {
            file_type: entry.file_type,
            uid: entry.uid,
            gid: entry.gid,
            permissions: entry.permissions,
            links: entry.links,
            information_length: entry.information_length,
            modified: entry.modified,
            partition,
        }
    }
}
