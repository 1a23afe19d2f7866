//! Volume descriptor parsing
//!
//! ISO9660 volume descriptors start at sector 16 and describe the filesystem layout.
//! An image may carry several tables of contents (a Primary descriptor plus
//! any number of Enhanced/Joliet descriptors), each with its own root
//! directory. [`IsoVolume::best_table`] picks the one with the best names.

pub mod primary;
pub mod supplementary;

use crate::directory::{self, record::DirectoryRecord};
use crate::error::{Error, Result};
use crate::file::extent::Extent;
use crate::source::ImageSource;
use crate::tree::FileTree;
use crate::types::{VolumeDescriptorType, SECTOR_SIZE, VOLUME_DESCRIPTOR_START};
use crate::utils::sector::sector_to_byte;
use primary::VolumeDescriptor;
use tracing::{debug, trace, warn};

/// Volume Descriptor header (first 7 bytes of each descriptor)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeDescriptorHeader {
    /// Type code (0=boot, 1=primary, 2=enhanced, 3=partition, 255=terminator)
    pub type_code: u8,

    /// Standard identifier "CD001"
    pub identifier: [u8; 5],

    /// Version (always 1)
    pub version: u8,
}

impl VolumeDescriptorHeader {
    /// CD001 magic bytes
    pub const MAGIC: &'static [u8; 5] = b"CD001";

    /// Read the header from the start of a descriptor sector
    pub fn parse(data: &[u8; SECTOR_SIZE]) -> Self {
        let mut identifier = [0u8; 5];
        identifier.copy_from_slice(&data[1..6]);
        Self {
            type_code: data[0],
            identifier,
            version: data[6],
        }
    }

    /// Check if header carries the standard identifier
    pub fn validate(&self) -> bool {
        &self.identifier == Self::MAGIC
    }
}

/// Scan the volume descriptor set
///
/// Reads sectors from 16 until a Terminator, an invalid identifier, the
/// first path table (as announced by a Primary descriptor) or the end of
/// the media. Primary, Enhanced and Partition descriptors are collected in
/// scan order; their position is the table index used by
/// [`crate::Settings`].
pub fn scan_descriptors<S: ImageSource + ?Sized>(source: &mut S) -> Result<Vec<VolumeDescriptor>> {
    let media_end = source.len()?;
    let mut limit = media_end;
    let mut buffer = [0u8; SECTOR_SIZE];
    let mut descriptors = Vec::new();

    let mut sector = VOLUME_DESCRIPTOR_START;
    while sector_to_byte(sector) < limit && sector_to_byte(sector + 1) <= media_end {
        source.read_sector(sector, &mut buffer)?;

        let header = VolumeDescriptorHeader::parse(&buffer);
        if !header.validate() {
            warn!(sector, "volume descriptor without CD001 identifier, stopping scan");
            break;
        }

        match VolumeDescriptorType::from_byte(header.type_code) {
            Some(VolumeDescriptorType::Terminator) => {
                trace!(sector, "volume descriptor set terminator");
                break;
            }
            Some(
                kind @ (VolumeDescriptorType::Primary
                | VolumeDescriptorType::Enhanced
                | VolumeDescriptorType::Partition),
            ) => {
                let descriptor = VolumeDescriptor::parse(&buffer, kind, descriptors.len(), sector);
                if kind == VolumeDescriptorType::Primary {
                    if let Some(path_table) = descriptor.path_table_limit() {
                        limit = limit.min(path_table);
                    }
                }
                debug!(
                    sector,
                    index = descriptor.index,
                    ?kind,
                    joliet = descriptor.is_joliet(),
                    "found volume descriptor"
                );
                descriptors.push(descriptor);
            }
            _ => trace!(sector, type_code = header.type_code, "skipping volume descriptor"),
        }

        sector += 1;
    }

    Ok(descriptors)
}

/// Table of contents picked by [`IsoVolume::best_table`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableChoice {
    /// Descriptor index
    pub table: usize,

    /// Whether Rock Ridge names should be used
    pub rock_ridge: bool,

    /// Longest name length that won, if any name was found
    pub score: Option<usize>,
}

/// ISO9660 volume: the scanned descriptor set of an image
#[derive(Debug, Clone, Default)]
pub struct IsoVolume {
    descriptors: Vec<VolumeDescriptor>,
}

impl IsoVolume {
    /// Scan the descriptor set of an image
    pub fn open<S: ImageSource + ?Sized>(source: &mut S) -> Result<Self> {
        Ok(Self {
            descriptors: scan_descriptors(source)?,
        })
    }

    /// All collected descriptors, in table index order
    pub fn descriptors(&self) -> &[VolumeDescriptor] {
        &self.descriptors
    }

    /// No tables of contents were found
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Root directory record of a table
    pub fn root(&self, table: usize) -> Result<&DirectoryRecord> {
        let descriptor = self.descriptors.get(table).ok_or(Error::TableOutOfRange {
            index: table,
            count: self.descriptors.len(),
        })?;
        descriptor
            .root
            .as_ref()
            .ok_or(Error::NoRootDirectory { index: table })
    }

    /// Build the file tree of one table
    pub fn build_tree<S: ImageSource + ?Sized>(
        &self,
        source: &mut S,
        table: usize,
        rock_ridge: bool,
    ) -> Result<FileTree> {
        let root = self.root(table)?;
        directory::build_tree(source, root, rock_ridge)
    }

    /// Flat list of every directory record reachable from an extent
    ///
    /// This is the raw view: "." and ".." records are included (but not
    /// followed) and no Rock Ridge names are applied.
    pub fn records<S: ImageSource + ?Sized>(
        source: &mut S,
        extent: Extent,
    ) -> Result<Vec<DirectoryRecord>> {
        directory::collect_records(source, extent)
    }

    /// Pick the table of contents with the longest names
    ///
    /// Every Primary/Enhanced table is walked and scored twice: by the
    /// longest Rock Ridge NM name and by the longest plain identifier among
    /// its files. The strictly longest wins; on ties the earlier table (and
    /// Rock Ridge over plain within one table) is kept. Tables that cannot
    /// be walked (truncated or cyclic) are skipped. When no table has any
    /// named file the first readable table is used without Rock Ridge.
    pub fn best_table<S: ImageSource + ?Sized>(&self, source: &mut S) -> Result<Option<TableChoice>> {
        let mut best: Option<TableChoice> = None;
        let mut first_readable = None;

        for descriptor in &self.descriptors {
            let Some(root) = descriptor.root.as_ref() else {
                continue;
            };

            let tree = match directory::build_tree(source, root, true) {
                Ok(tree) => tree,
                Err(e) if is_unreadable_table(&e) => {
                    warn!(table = descriptor.index, error = %e, "skipping unreadable table of contents");
                    continue;
                }
                Err(e) => return Err(e),
            };
            first_readable.get_or_insert(descriptor.index);

            let rock_ridge = directory::longest_alternate_name(&tree);
            let plain = directory::longest_identifier(&tree);
            debug!(table = descriptor.index, ?rock_ridge, ?plain, "scored table of contents");

            let best_score = best.and_then(|b| b.score);
            if rock_ridge > best_score {
                best = Some(TableChoice {
                    table: descriptor.index,
                    rock_ridge: true,
                    score: rock_ridge,
                });
            }
            let best_score = best.and_then(|b| b.score);
            if plain > best_score {
                best = Some(TableChoice {
                    table: descriptor.index,
                    rock_ridge: false,
                    score: plain,
                });
            }
        }

        Ok(best.or_else(|| {
            first_readable.map(|table| TableChoice {
                table,
                rock_ridge: false,
                score: None,
            })
        }))
    }
}

/// Errors that disqualify a single table rather than the whole image
fn is_unreadable_table(error: &Error) -> bool {
    match error {
        Error::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
        Error::DirectoryCycle { .. } | Error::DirectoryTooDeep { .. } => true,
        _ => false,
    }
}
