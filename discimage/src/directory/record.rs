//! Directory Record structure
//!
//! Directory records describe files and subdirectories. A record never
//! crosses a sector boundary, so parsing always works on one sector slice.

use crate::directory::flags::FileFlags;
use crate::extensions::rock_ridge::SystemUseArea;
use crate::file::extent::Extent;
use crate::utils::{bytes, datetime::DateTime7, string};

/// Directory Record (variable length, ECMA-119 9.1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    /// Length of directory record (BP 1)
    pub length: u8,

    /// Extended attribute record length (BP 2)
    pub extended_attr_length: u8,

    /// Extent location (BP 3-10)
    pub extent_lba: u32,

    /// Data length (BP 11-18)
    pub data_length: u32,

    /// Recording date and time (BP 19-25)
    pub recording_datetime: DateTime7,

    /// File flags (BP 26)
    pub flags: FileFlags,

    /// File unit size (interleaved files) (BP 27)
    pub file_unit_size: u8,

    /// Interleave gap size (BP 28)
    pub interleave_gap: u8,

    /// Volume sequence number (BP 29-32)
    pub volume_sequence: u16,

    /// Raw file identifier bytes
    pub identifier: Vec<u8>,

    /// Raw system use area (Rock Ridge lives here)
    pub system_use: Vec<u8>,
}

impl DirectoryRecord {
    /// Fixed part of the record, up to and including the identifier length
    pub const HEADER_LENGTH: usize = 33;

    /// Parse directory record from the start of `data`
    ///
    /// Returns `None` if the length byte is zero, or if the record claims
    /// more bytes than `data` holds or its identifier overruns the record.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let length = *data.first()? as usize;
        if length < Self::HEADER_LENGTH || length > data.len() {
            return None;
        }
        let record = &data[..length];

        let id_len = record[32] as usize;
        if Self::HEADER_LENGTH + id_len > length {
            return None;
        }
        let identifier = record[33..33 + id_len].to_vec();

        // Identifier is padded to an even offset before the system use area
        let system_use_start = if id_len % 2 == 0 { 34 + id_len } else { 33 + id_len };
        let system_use = record.get(system_use_start..).unwrap_or(&[]).to_vec();

        let mut datetime = [0u8; 7];
        datetime.copy_from_slice(&record[18..25]);

        Some(Self {
            length: record[0],
            extended_attr_length: record[1],
            extent_lba: bytes::both_u32(record, 2),
            data_length: bytes::both_u32(record, 10),
            recording_datetime: DateTime7::from_bytes(&datetime),
            flags: FileFlags::from_byte(record[25]),
            file_unit_size: record[26],
            interleave_gap: record[27],
            volume_sequence: bytes::both_u16(record, 28),
            identifier,
            system_use,
        })
    }

    /// Extent holding this record's data
    pub fn extent(&self) -> Extent {
        Extent::new(self.extent_lba as u64, self.data_length as u64)
    }

    /// Is this a directory that should be walked?
    pub fn is_directory(&self) -> bool {
        self.flags.is_walkable_directory()
    }

    /// Is this the "." (0x00) or ".." (0x01) entry of a directory?
    pub fn is_top_level_identifier(&self) -> bool {
        matches!(self.identifier.as_slice(), [0x00] | [0x01])
    }

    /// Decoded identifier
    ///
    /// "." and ".." for the self/parent entries; otherwise UTF-16BE when the
    /// identifier contains a zero byte, UTF-8 otherwise.
    pub fn name(&self) -> String {
        match self.identifier.as_slice() {
            [0x00] => String::from("."),
            [0x01] => String::from(".."),
            raw => string::decode_identifier(raw),
        }
    }

    /// Rock Ridge view of the system use area
    pub fn system_use_area(&self) -> SystemUseArea<'_> {
        SystemUseArea::new(&self.system_use)
    }
}
