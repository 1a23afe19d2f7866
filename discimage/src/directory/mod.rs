//! Directory record parsing and tree building
//!
//! Walks a table of contents from its root record, following every
//! directory record except "." and "..", and builds a [`FileTree`].
//! The walk keeps the set of directory extents on the current path so a
//! self-referencing image ends in [`Error::DirectoryCycle`] instead of
//! unbounded recursion.

pub mod flags;
pub mod iterator;
pub mod record;

use crate::error::{Error, Result};
use crate::extensions::rock_ridge::PosixAttributes;
use crate::file::extent::Extent;
use crate::source::ImageSource;
use crate::tree::{FileTree, Node, NodeId, NodeKind};
use crate::types::MAX_DIRECTORY_DEPTH;
use crate::utils::datetime::DateTime7;
use flags::FileFlags;
use record::DirectoryRecord;
use std::collections::HashSet;
use tracing::{debug, warn};

/// ISO9660-specific node metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoNode {
    /// Decoded directory record identifier (version suffix kept)
    pub identifier: String,

    /// Rock Ridge NM name, if the record has one
    pub alternate_name: Option<String>,

    /// Rock Ridge PX attributes, if the record has them
    pub posix: Option<PosixAttributes>,

    /// File flags
    pub flags: FileFlags,

    /// Recording date and time
    pub recorded: DateTime7,

    /// For directories: every sector of the extent ended on zero padding
    pub clean_finish: bool,
}

impl IsoNode {
    fn from_record(record: &DirectoryRecord) -> Self {
        let area = record.system_use_area();
        Self {
            identifier: record.name(),
            alternate_name: area.alternate_name().map(|nm| nm.name),
            posix: area.posix_attributes(),
            flags: record.flags,
            recorded: record.recording_datetime,
            clean_finish: true,
        }
    }
}

struct TreeBuilder<'s, S: ImageSource + ?Sized> {
    source: &'s mut S,
    rock_ridge: bool,
    tree: FileTree,
    visiting: HashSet<u64>,
}

impl<'s, S: ImageSource + ?Sized> TreeBuilder<'s, S> {
    fn walk(&mut self, parent: NodeId, extent: Extent, depth: usize) -> Result<()> {
        if depth > MAX_DIRECTORY_DEPTH {
            return Err(Error::DirectoryTooDeep {
                depth: MAX_DIRECTORY_DEPTH,
            });
        }
        if !self.visiting.insert(extent.sector) {
            return Err(Error::DirectoryCycle {
                sector: extent.sector,
            });
        }

        let listing = iterator::read_directory(self.source, extent)?;
        if let NodeKind::Iso(iso) = self.tree.node_mut(parent).kind_mut() {
            iso.clean_finish = listing.clean_finish;
        }

        for record in listing.records {
            if record.is_top_level_identifier() {
                continue;
            }
            let iso = IsoNode::from_record(&record);
            let name = match (&iso.alternate_name, self.rock_ridge) {
                (Some(nm), true) => nm.clone(),
                _ => iso.identifier.clone(),
            };
            let node = Node::new(
                name,
                record.data_length as u64,
                record.extent_lba as u64,
                record.is_directory(),
                NodeKind::Iso(iso),
            );
            let child = self.tree.attach(parent, node);
            if record.is_directory() {
                self.walk(child, record.extent(), depth + 1)?;
            }
        }

        self.visiting.remove(&extent.sector);
        Ok(())
    }
}

/// Build the file tree below a root directory record
///
/// With `rock_ridge` set, nodes are named by their NM entry where one
/// exists; the plain identifier is always kept in [`IsoNode::identifier`].
pub fn build_tree<S: ImageSource + ?Sized>(
    source: &mut S,
    root: &DirectoryRecord,
    rock_ridge: bool,
) -> Result<FileTree> {
    let root_node = Node::new(
        String::new(),
        root.data_length as u64,
        root.extent_lba as u64,
        true,
        NodeKind::Iso(IsoNode::from_record(root)),
    );
    let mut builder = TreeBuilder {
        source,
        rock_ridge,
        tree: FileTree::with_root(root_node),
        visiting: HashSet::new(),
    };
    let root_id = builder.tree.root();
    builder.walk(root_id, root.extent(), 0)?;

    debug!(
        nodes = builder.tree.len(),
        rock_ridge,
        "built ISO9660 tree"
    );
    Ok(builder.tree)
}

/// Every record reachable from an extent, flattened in walk order
///
/// Directories are listed before their contents. "." and ".." records are
/// kept but never followed.
pub fn collect_records<S: ImageSource + ?Sized>(
    source: &mut S,
    extent: Extent,
) -> Result<Vec<DirectoryRecord>> {
    fn collect<S: ImageSource + ?Sized>(
        source: &mut S,
        extent: Extent,
        depth: usize,
        visiting: &mut HashSet<u64>,
        out: &mut Vec<DirectoryRecord>,
    ) -> Result<()> {
        if depth > MAX_DIRECTORY_DEPTH {
            return Err(Error::DirectoryTooDeep {
                depth: MAX_DIRECTORY_DEPTH,
            });
        }
        if !visiting.insert(extent.sector) {
            return Err(Error::DirectoryCycle {
                sector: extent.sector,
            });
        }
        let listing = iterator::read_directory(source, extent)?;
        if !listing.clean_finish {
            warn!(sector = extent.sector, "directory extent ended uncleanly");
        }
        for record in listing.records {
            let follow = record.is_directory() && !record.is_top_level_identifier();
            let child = record.extent();
            out.push(record);
            if follow {
                collect(source, child, depth + 1, visiting, out)?;
            }
        }
        visiting.remove(&extent.sector);
        Ok(())
    }

    let mut out = Vec::new();
    collect(source, extent, 0, &mut HashSet::new(), &mut out)?;
    Ok(out)
}

/// Longest Rock Ridge NM name among the files of a tree
pub fn longest_alternate_name(tree: &FileTree) -> Option<usize> {
    tree.files()
        .into_iter()
        .filter_map(|id| match tree.node(id).kind() {
            NodeKind::Iso(iso) => iso.alternate_name.as_ref().map(|nm| nm.chars().count()),
            NodeKind::Udf(_) => None,
        })
        .max()
}

/// Longest plain identifier among the files of a tree, ignoring Rock Ridge
pub fn longest_identifier(tree: &FileTree) -> Option<usize> {
    tree.files()
        .into_iter()
        .filter_map(|id| match tree.node(id).kind() {
            NodeKind::Iso(iso) => Some(iso.identifier.chars().count()),
            NodeKind::Udf(_) => None,
        })
        .max()
}
