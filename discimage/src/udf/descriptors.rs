//! UDF volume structure descriptors (ECMA-167 part 3)
//!
//! Only the fields the walk and the tree builder need are decoded; the raw
//! sector stays with the caller.

use super::tag::Tag;
use crate::error::UdfFormatError;
use crate::utils::datetime::UdfTimestamp;
use crate::utils::{bytes, string};

/// Extent descriptor: length in bytes plus starting sector (3/7.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtentAd {
    /// Length in bytes
    pub length: u32,

    /// Starting sector
    pub location: u32,
}

impl ExtentAd {
    /// Decode the 8-byte form at `offset`
    pub fn parse(raw: &[u8], offset: usize) -> Self {
        Self {
            length: bytes::le_u32(raw, offset),
            location: bytes::le_u32(raw, offset + 4),
        }
    }

    /// Byte offset one past the extent
    pub fn end_byte(&self) -> u64 {
        self.location as u64 * crate::types::SECTOR_SIZE as u64 + self.length as u64
    }
}

/// Long allocation descriptor: extent inside a numbered partition (4/14.14.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LongAd {
    /// Length in bytes (extent type bits masked off)
    pub length: u32,

    /// Logical block number inside the partition
    pub block: u32,

    /// Partition reference number
    pub partition: u16,
}

impl LongAd {
    /// Decode the 16-byte form at `offset`
    pub fn parse(raw: &[u8], offset: usize) -> Self {
        Self {
            length: bytes::le_u32(raw, offset) & 0x3FFF_FFFF,
            block: bytes::le_u32(raw, offset + 4),
            partition: bytes::le_u16(raw, offset + 8),
        }
    }
}

/// Anchor Volume Descriptor Pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorPointer {
    /// Sector the descriptor was read from
    pub sector: u64,
    /// Main volume descriptor sequence
    pub main_sequence: ExtentAd,
    /// Reserve copy of the sequence
    pub reserve_sequence: ExtentAd,
}

/// Primary Volume Descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryVolume {
    /// Sector the descriptor was read from
    pub sector: u64,
    /// Volume descriptor sequence number
    pub sequence_number: u32,
    /// Volume identifier
    pub volume_id: String,
    /// Volume set identifier
    pub volume_set_id: String,
    /// Recording date and time
    pub recorded: UdfTimestamp,
}

/// Volume Descriptor Pointer: continuation of the descriptor sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumePointer {
    /// Sector the descriptor was read from
    pub sector: u64,
    /// Next extent of the sequence
    pub next_sequence: ExtentAd,
}

/// Partition Descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionDescriptor {
    /// Sector the descriptor was read from
    pub sector: u64,

    /// Partition number referenced by long_ads
    pub number: u16,

    /// First sector of the partition
    pub start: u32,

    /// Length in sectors
    pub length: u32,
}

impl PartitionDescriptor {
    /// Sectors covered by the partition
    pub fn sectors(&self) -> core::ops::Range<u64> {
        self.start as u64..self.start as u64 + self.length as u64
    }
}

/// Logical Volume Descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalVolume {
    /// Sector the descriptor was read from
    pub sector: u64,
    /// Logical block size in bytes
    pub logical_block_size: u32,
    /// Logical volume identifier
    pub identifier: String,

    /// Where the File Set Descriptor lives
    pub file_set: LongAd,

    /// Logical Volume Integrity sequence
    pub integrity_sequence: ExtentAd,
}

/// Logical Volume Integrity Descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityDescriptor {
    /// Sector the descriptor was read from
    pub sector: u64,
    /// Recording date and time
    pub recorded: UdfTimestamp,

    /// Next integrity extent; a zero location ends the chain
    pub next: ExtentAd,
}

/// File Set Descriptor (4/14.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSetDescriptor {
    /// Sector the descriptor was read from
    pub sector: u64,
    /// Recording date and time
    pub recorded: UdfTimestamp,
    /// File set identifier
    pub file_set_id: String,

    /// ICB of the root directory
    pub root: LongAd,
}

impl FileSetDescriptor {
    /// Decode a File Set Descriptor sector
    pub fn parse(raw: &[u8], sector: u64) -> Self {
        Self {
            sector,
            recorded: UdfTimestamp::from_bytes(bytes::slice(raw, 16, 12)),
            file_set_id: string::decode_fixed_dstring(bytes::slice(raw, 304, 32)),
            root: LongAd::parse(raw, 400),
        }
    }
}

/// Any descriptor met while walking a volume descriptor sequence
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Descriptor {
    Anchor(AnchorPointer),
    PrimaryVolume(PrimaryVolume),
    Pointer(VolumePointer),
    ImplementationUse { sector: u64 },
    Partition(PartitionDescriptor),
    LogicalVolume(LogicalVolume),
    UnallocatedSpace { sector: u64 },
    Terminating { sector: u64 },
    Integrity(IntegrityDescriptor),
}

impl Descriptor {
    /// Decode a descriptor read from `sector`
    ///
    /// Returns `Ok(None)` for a blank (tag 0) sector. Any tag that does not
    /// belong in a volume descriptor sequence is fatal.
    pub fn parse(tag: &Tag, raw: &[u8], sector: u64) -> Result<Option<Self>, UdfFormatError> {
        let descriptor = match tag.identifier {
            0 => return Ok(None),
            Tag::PRIMARY_VOLUME => Self::PrimaryVolume(PrimaryVolume {
                sector,
                sequence_number: bytes::le_u32(raw, 16),
                volume_id: string::decode_fixed_dstring(bytes::slice(raw, 24, 32)),
                volume_set_id: string::decode_fixed_dstring(bytes::slice(raw, 72, 128)),
                recorded: UdfTimestamp::from_bytes(bytes::slice(raw, 376, 12)),
            }),
            Tag::ANCHOR_POINTER => Self::Anchor(AnchorPointer {
                sector,
                main_sequence: ExtentAd::parse(raw, 16),
                reserve_sequence: ExtentAd::parse(raw, 24),
            }),
            Tag::VOLUME_POINTER => Self::Pointer(VolumePointer {
                sector,
                next_sequence: ExtentAd::parse(raw, 20),
            }),
            Tag::IMPLEMENTATION_USE => Self::ImplementationUse { sector },
            Tag::PARTITION => Self::Partition(PartitionDescriptor {
                sector,
                number: bytes::le_u16(raw, 22),
                start: bytes::le_u32(raw, 188),
                length: bytes::le_u32(raw, 192),
            }),
            Tag::LOGICAL_VOLUME => Self::LogicalVolume(LogicalVolume {
                sector,
                logical_block_size: bytes::le_u32(raw, 212),
                identifier: string::decode_fixed_dstring(bytes::slice(raw, 84, 128)),
                file_set: LongAd::parse(raw, 248),
                integrity_sequence: ExtentAd::parse(raw, 432),
            }),
            Tag::UNALLOCATED_SPACE => Self::UnallocatedSpace { sector },
            Tag::TERMINATING => Self::Terminating { sector },
            Tag::LOGICAL_VOLUME_INTEGRITY => Self::Integrity(IntegrityDescriptor {
                sector,
                recorded: UdfTimestamp::from_bytes(bytes::slice(raw, 16, 12)),
                next: ExtentAd::parse(raw, 32),
            }),
            tag => return Err(UdfFormatError::UnknownDescriptor { tag, sector }),
        };
        Ok(Some(descriptor))
    }

    /// Sector the descriptor was read from
    pub fn sector(&self) -> u64 {
        match self {
            Self::Anchor(d) => d.sector,
            Self::PrimaryVolume(d) => d.sector,
            Self::Pointer(d) => d.sector,
            Self::Partition(d) => d.sector,
            Self::LogicalVolume(d) => d.sector,
            Self::Integrity(d) => d.sector,
            Self::ImplementationUse { sector }
            | Self::UnallocatedSpace { sector }
            | Self::Terminating { sector } => *sector,
        }
    }

    /// Follow-on extent this descriptor points at, if any
    pub fn continuation(&self) -> Option<ExtentAd> {
        match self {
            Self::Anchor(d) => Some(d.main_sequence),
            Self::Pointer(d) => Some(d.next_sequence),
            Self::LogicalVolume(d) => Some(d.integrity_sequence),
            Self::Integrity(d) => Some(d.next),
            _ => None,
        }
        .filter(|extent| extent.location != 0)
    }
}
