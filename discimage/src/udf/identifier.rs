//! File Identifier Descriptor (ECMA-167 4/14.4)

use super::descriptors::LongAd;
use crate::utils::{bytes, string};

const FIXED_LENGTH: usize = 38;

/// One directory entry inside a UDF directory extent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentifier {
    /// File characteristics bits
    pub characteristics: u8,

    /// ICB of the entry's (Extended) File Entry
    pub icb: LongAd,

    /// Raw dstring identifier
    pub identifier: Vec<u8>,

    /// Bytes the descriptor occupies, padding included
    pub length: usize,
}

impl FileIdentifier {
    /// Hidden from listings
    pub const HIDDEN: u8 = 0x01;
    /// Names a directory
    pub const DIRECTORY: u8 = 0x02;
    /// Deleted entry
    pub const DELETED: u8 = 0x04;
    /// Entry for the parent directory
    pub const PARENT: u8 = 0x08;

    /// Decode the descriptor at the start of `raw`
    ///
    /// Returns `None` when `raw` is too short to hold it.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        if raw.len() < FIXED_LENGTH {
            return None;
        }
        let identifier_length = bytes::u8_at(raw, 19) as usize;
        let implementation_length = bytes::le_u16(raw, 36) as usize;
        let name_at = FIXED_LENGTH + implementation_length;
        let end = name_at + identifier_length;
        if end > raw.len() {
            return None;
        }

        Some(Self {
            characteristics: bytes::u8_at(raw, 18),
            icb: LongAd::parse(raw, 20),
            identifier: raw[name_at..end].to_vec(),
            // Padded to four bytes; the last one in an extent may lose its padding
            length: end.next_multiple_of(4).min(raw.len()),
        })
    }

    /// Parent directory entry
    pub fn is_parent(&self) -> bool {
        self.characteristics & Self::PARENT != 0
    }

    /// Deleted entry
    pub fn is_deleted(&self) -> bool {
        self.characteristics & Self::DELETED != 0
    }

    /// Decoded name
    pub fn name(&self) -> String {
        string::decode_dstring(&self.identifier)
    }
}
