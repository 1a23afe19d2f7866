//! UDF partition scan and directory walk
//!
//! The partitions are scanned for the File Set Descriptor; its root ICB is
//! then followed through File Entries and File Identifier Descriptors.
//! Metadata blocks are addressed from the File Set Descriptor's own sector,
//! file data from the start of the partition its ICB names.

use super::descriptors::{FileSetDescriptor, PartitionDescriptor};
use super::file_entry::{FileEntry, UdfNode};
use super::identifier::FileIdentifier;
use super::tag::{self, Tag};
use crate::error::{Error, Result, UdfFormatError};
use crate::source::ImageSource;
use crate::tree::{FileTree, Node, NodeId, NodeKind};
use crate::types::{MAX_DIRECTORY_DEPTH, SECTOR_SIZE};
use crate::utils::sector::sector_to_byte;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Scan `partitions` for the file set and build its tree
pub fn build_tree<S: ImageSource + ?Sized>(
    source: &mut S,
    partitions: &[&PartitionDescriptor],
) -> Result<FileTree> {
    let mut starts = HashMap::new();
    for pd in partitions {
        starts.entry(pd.number).or_insert(pd.start as u64);
    }

    for pd in partitions {
        let mut sector = pd.start as u64;
        let end = pd.sectors().end;
        while sector < end {
            let (tag, raw) = tag::read_descriptor(source, sector)?;
            match tag.identifier {
                Tag::FILE_SET => {
                    let fsd = FileSetDescriptor::parse(&raw, sector);
                    debug!(
                        sector,
                        partition = pd.number,
                        file_set = %fsd.file_set_id,
                        "found file set descriptor"
                    );
                    starts.insert(fsd.root.partition, pd.start as u64);
                    let builder = UdfTreeBuilder {
                        source,
                        base: sector,
                        partitions: starts,
                        visiting: HashSet::new(),
                    };
                    return builder.build(&fsd);
                }
                Tag::EXTENDED_FILE_ENTRY => {
                    let entry = FileEntry::parse(&raw, true);
                    let skip = (entry.information_length / SECTOR_SIZE as u64).max(1);
                    trace!(sector, skip, "skipping extended file entry before file set");
                    sector += skip;
                }
                found => {
                    return Err(UdfFormatError::UnexpectedTag {
                        expected: Tag::FILE_SET,
                        found,
                        sector,
                    }
                    .into())
                }
            }
        }
    }

    Err(UdfFormatError::NoFileSet.into())
}

struct UdfTreeBuilder<'s, S: ImageSource + ?Sized> {
    source: &'s mut S,
    base: u64,
    partitions: HashMap<u16, u64>,
    visiting: HashSet<u64>,
}

impl<'s, S: ImageSource + ?Sized> UdfTreeBuilder<'s, S> {
    fn build(mut self, fsd: &FileSetDescriptor) -> Result<FileTree> {
        let (sector, root_entry) = self.read_entry(fsd.root.block)?;
        let root = self.node(String::new(), &root_entry, sector, fsd.root.partition)?;
        let is_directory = root.is_directory();
        let mut tree = FileTree::with_root(root);
        if is_directory {
            let root_id = tree.root();
            self.walk(&mut tree, root_id, &root_entry, 0)?;
        }
        Ok(tree)
    }

    fn read_entry(&mut self, block: u32) -> Result<(u64, FileEntry)> {
        let sector = self.base + block as u64;
        let (tag, raw) = tag::read_descriptor(self.source, sector)?;
        let extended = match tag.identifier {
            Tag::FILE_ENTRY => false,
            Tag::EXTENDED_FILE_ENTRY => true,
            found => {
                return Err(UdfFormatError::UnexpectedTag {
                    expected: Tag::FILE_ENTRY,
                    found,
                    sector,
                }
                .into())
            }
        };
        Ok((sector, FileEntry::parse(&raw, extended)))
    }

    fn node(&self, name: String, entry: &FileEntry, sector: u64, partition: u16) -> Result<Node> {
        let ad = entry.allocation;
        let kind = NodeKind::Udf(UdfNode::from_entry(entry, partition));
        match entry.file_type {
            FileEntry::DIRECTORY => Ok(Node::new(
                name,
                ad.length as u64,
                self.base + ad.location as u64,
                true,
                kind,
            )),
            FileEntry::FILE => {
                let start = self
                    .partitions
                    .get(&partition)
                    .ok_or(UdfFormatError::UnknownPartition(partition))?;
                Ok(Node::new(
                    name,
                    ad.length as u64,
                    start + ad.location as u64,
                    false,
                    kind,
                ))
            }
            file_type => Err(UdfFormatError::UnsupportedFileType { file_type, sector }.into()),
        }
    }

    fn walk(&mut self, tree: &mut FileTree, parent: NodeId, entry: &FileEntry, depth: usize) -> Result<()> {
        if depth > MAX_DIRECTORY_DEPTH {
            return Err(Error::DirectoryTooDeep {
                depth: MAX_DIRECTORY_DEPTH,
            });
        }
        let extent_sector = self.base + entry.allocation.location as u64;
        if !self.visiting.insert(extent_sector) {
            return Err(Error::DirectoryCycle {
                sector: extent_sector,
            });
        }

        let mut data = vec![0u8; entry.allocation.length as usize];
        self.source
            .read_exact_at(sector_to_byte(extent_sector), &mut data)?;

        let mut position = 0;
        while position < data.len() {
            let rest = &data[position..];
            if rest.iter().all(|&b| b == 0) {
                break;
            }
            let here = extent_sector + (position / SECTOR_SIZE) as u64;
            let tag = Tag::parse(rest);
            if tag.identifier != Tag::FILE_IDENTIFIER {
                return Err(UdfFormatError::UnexpectedTag {
                    expected: Tag::FILE_IDENTIFIER,
                    found: tag.identifier,
                    sector: here,
                }
                .into());
            }
            let Some(fid) = FileIdentifier::parse(rest) else {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("file identifier at sector {here} runs past its directory"),
                )));
            };
            position += fid.length;

            if fid.is_parent() || fid.is_deleted() {
                continue;
            }

            let (sector, child_entry) = self.read_entry(fid.icb.block)?;
            let node = self.node(fid.name(), &child_entry, sector, fid.icb.partition)?;
            let is_directory = node.is_directory();
            let child = tree.attach(parent, node);
            if is_directory {
                self.walk(tree, child, &child_entry, depth + 1)?;
            }
        }

        self.visiting.remove(&extent_sector);
        Ok(())
    }
}
