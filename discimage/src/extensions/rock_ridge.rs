//! Rock Ridge extension support
//!
//! Rock Ridge adds POSIX filesystem semantics (permissions, symlinks, long names).
//! Entries follow the SUSP layout: 2-byte signature, 1-byte length, 1-byte
//! version, then signature-specific data.

use crate::utils::bytes;
use tracing::trace;

/// Size of the SUSP entry header
pub const ENTRY_HEADER_LENGTH: usize = 4;

/// NM flag: name continues in the next NM entry
pub const NM_CONTINUE: u8 = 0x01;

/// Signature constants
pub mod signatures {
    /// POSIX file attributes signature
    pub const POSIX_ATTRS: &[u8; 2] = b"PX";
    /// POSIX device number signature
    pub const POSIX_DEV: &[u8; 2] = b"PN";
    /// Symbolic link signature
    pub const SYMLINK: &[u8; 2] = b"SL";
    /// Alternate name signature
    pub const ALTERNATE_NAME: &[u8; 2] = b"NM";
    /// Child link signature
    pub const CHILD_LINK: &[u8; 2] = b"CL";
    /// Parent link signature
    pub const PARENT_LINK: &[u8; 2] = b"PL";
    /// Relocated directory signature
    pub const RELOCATED_DIR: &[u8; 2] = b"RE";
    /// Timestamps signature
    pub const TIMESTAMPS: &[u8; 2] = b"TF";
    /// Rock Ridge extensions in use signature
    pub const RR_IN_USE: &[u8; 2] = b"RR";
    /// SUSP area terminator
    pub const TERMINATOR: &[u8; 2] = b"ST";
}

/// One System Use Entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemUseEntry<'a> {
    /// Signature (2 bytes, e.g. "PX", "NM", "SL")
    pub signature: [u8; 2],

    /// Length of entry, header included
    pub length: u8,

    /// Version
    pub version: u8,

    /// Entry-specific data following the header
    pub data: &'a [u8],
}

/// POSIX file attributes (PX entry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PosixAttributes {
    /// File mode (st_mode)
    pub mode: u32,

    /// Number of links (st_nlink)
    pub links: u32,

    /// User ID (st_uid)
    pub uid: u32,

    /// Group ID (st_gid)
    pub gid: u32,
}

impl PosixAttributes {
    /// Permission bits of the mode
    pub fn permissions(&self) -> u32 {
        self.mode & 0o7777
    }

    /// Mode says directory
    pub fn is_directory(&self) -> bool {
        self.mode & 0o170000 == 0o040000
    }
}

/// Alternate name (NM entry)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateName {
    /// Flags of the last NM entry
    pub flags: u8,

    /// Name content, continuation entries joined
    pub name: String,
}

/// Rock Ridge view over a directory record's system use area
#[derive(Debug, Clone, Copy)]
pub struct SystemUseArea<'a> {
    data: &'a [u8],
}

impl<'a> SystemUseArea<'a> {
    /// Wrap raw system use bytes
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Iterate the entries in order
    pub fn entries(&self) -> SystemUseEntries<'a> {
        SystemUseEntries { data: self.data, pos: 0 }
    }

    /// Find the first entry with a signature
    pub fn find(&self, signature: &[u8; 2]) -> Option<SystemUseEntry<'a>> {
        self.entries().find(|e| &e.signature == signature)
    }

    /// Any entries at all
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Long name from NM entries
    ///
    /// Consecutive NM entries are joined while the continue flag is set.
    pub fn alternate_name(&self) -> Option<AlternateName> {
        let mut name: Option<AlternateName> = None;
        for entry in self.entries() {
            if &entry.signature != signatures::ALTERNATE_NAME {
                continue;
            }
            let flags = bytes::u8_at(entry.data, 0);
            let part = String::from_utf8_lossy(entry.data.get(1..).unwrap_or(&[]));
            let done = flags & NM_CONTINUE == 0;
            match name.as_mut() {
                Some(existing) => {
                    existing.name.push_str(&part);
                    existing.flags = flags;
                }
                None => {
                    name = Some(AlternateName {
                        flags,
                        name: part.into_owned(),
                    })
                }
            }
            if done {
                break;
            }
        }
        name
    }

    /// POSIX attributes from the PX entry
    pub fn posix_attributes(&self) -> Option<PosixAttributes> {
        let px = self.find(signatures::POSIX_ATTRS)?;
        if px.data.len() < 32 {
            return None;
        }
        Some(PosixAttributes {
            mode: bytes::both_u32(px.data, 0),
            links: bytes::both_u32(px.data, 8),
            uid: bytes::both_u32(px.data, 16),
            gid: bytes::both_u32(px.data, 24),
        })
    }
}

/// Iterator over [`SystemUseEntry`] values
#[derive(Debug, Clone)]
pub struct SystemUseEntries<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for SystemUseEntries<'a> {
    type Item = SystemUseEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.pos..)?;
        if rest.len() < ENTRY_HEADER_LENGTH {
            return None;
        }
        let length = rest[2] as usize;
        if length < ENTRY_HEADER_LENGTH || length > rest.len() {
            trace!(offset = self.pos, length, "system use entry out of bounds");
            self.pos = self.data.len();
            return None;
        }
        let signature = [rest[0], rest[1]];
        if &signature == signatures::TERMINATOR {
            self.pos = self.data.len();
            return None;
        }
        self.pos += length;
        Some(SystemUseEntry {
            signature,
            length: rest[2],
            version: rest[3],
            data: &rest[ENTRY_HEADER_LENGTH..length],
        })
    }
}
