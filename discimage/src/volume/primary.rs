//! Primary/Enhanced Volume Descriptor parsing
//!
//! Primary (type 1) and Enhanced/Supplementary (type 2) descriptors share
//! one layout (ECMA-119 8.4 and 8.5); only the character set of their text
//! fields differs. Both carry the root directory record at byte 156.

use crate::directory::record::DirectoryRecord;
use crate::types::{VolumeDescriptorType, SECTOR_SIZE};
use crate::utils::{bytes, datetime::DateTime17, string};
use crate::volume::supplementary;

/// Offset of the embedded root directory record
pub const ROOT_RECORD_OFFSET: usize = 156;

/// Length of the embedded root directory record
pub const ROOT_RECORD_LENGTH: usize = 34;

/// One decoded volume descriptor from the descriptor set
#[derive(Debug, Clone)]
pub struct VolumeDescriptor {
    /// Position in the scanned descriptor list (the "table of contents" index)
    pub index: usize,

    /// Sector the descriptor was read from
    pub sector: u64,

    /// Descriptor type
    pub kind: VolumeDescriptorType,

    /// Descriptor version byte
    pub version: u8,

    /// System identifier
    pub system_id: String,

    /// Volume identifier
    pub volume_id: String,

    /// Volume space size in logical blocks
    pub volume_space_size: u32,

    /// Logical block size (usually 2048)
    pub logical_block_size: u16,

    /// Path table size in bytes
    pub path_table_size: u32,

    /// Type L (little-endian) path table sector
    pub type_l_path_table: u32,

    /// Type M (big-endian) path table sector
    pub type_m_path_table: u32,

    /// Joliet level (1-3) if the escape sequences announce UCS-2
    pub joliet_level: Option<u8>,

    /// Volume creation date
    pub creation_date: Option<DateTime17>,

    /// Root directory record (Primary and Enhanced only)
    pub root: Option<DirectoryRecord>,
}

impl VolumeDescriptor {
    /// Decode a descriptor sector of a known type
    pub fn parse(
        data: &[u8; SECTOR_SIZE],
        kind: VolumeDescriptorType,
        index: usize,
        sector: u64,
    ) -> Self {
        let joliet_level = match kind {
            VolumeDescriptorType::Enhanced => supplementary::joliet_level(&data[88..120]),
            _ => None,
        };
        let ucs2 = joliet_level.is_some();

        let root = if kind.has_root() {
            DirectoryRecord::parse(
                &data[ROOT_RECORD_OFFSET..ROOT_RECORD_OFFSET + ROOT_RECORD_LENGTH],
            )
        } else {
            None
        };

        let mut created = [0u8; 17];
        created.copy_from_slice(&data[813..830]);

        Self {
            index,
            sector,
            kind,
            version: data[6],
            system_id: string::decode_padded(&data[8..40], ucs2),
            volume_id: string::decode_padded(&data[40..72], ucs2),
            volume_space_size: bytes::both_u32(data, 80),
            logical_block_size: bytes::both_u16(data, 128),
            path_table_size: bytes::both_u32(data, 132),
            type_l_path_table: bytes::le_u32(data, 140),
            type_m_path_table: bytes::be_u32(data, 148),
            joliet_level,
            creation_date: DateTime17::from_bytes(&created),
            root,
        }
    }

    /// Whether this descriptor is a Joliet table
    pub fn is_joliet(&self) -> bool {
        self.joliet_level.is_some()
    }

    /// Lowest path table byte offset, ignoring unset locations
    ///
    /// Path tables follow the descriptor set, so the scan never needs to
    /// read past the first one. Locations inside the descriptor area itself
    /// are treated as unset.
    pub fn path_table_limit(&self) -> Option<u64> {
        [self.type_l_path_table, self.type_m_path_table]
            .into_iter()
            .filter(|&loc| loc as u64 > crate::types::VOLUME_DESCRIPTOR_START)
            .map(|loc| loc as u64 * SECTOR_SIZE as u64)
            .min()
    }
}
