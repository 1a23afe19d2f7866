//! UDF (ECMA-167 / OSTA UDF) volume parsing
//!
//! Opening a volume means finding an Anchor Volume Descriptor Pointer,
//! then walking the descriptor sequences it points at, recursively: the
//! main sequence, any Volume Descriptor Pointer continuations, and the
//! Logical Volume Integrity chain. Structural inconsistencies are fatal
//! ([`UdfFormatError`]).

pub mod descriptors;
pub mod directory;
pub mod file_entry;
pub mod identifier;
pub mod tag;

use crate::error::{Result, UdfFormatError};
use crate::source::ImageSource;
use crate::tree::FileTree;
use crate::types::SECTOR_SIZE;
use crate::utils::sector::sector_to_byte;
use descriptors::{Descriptor, LogicalVolume, PartitionDescriptor, PrimaryVolume};
use std::collections::HashSet;
use tag::Tag;
use tracing::{debug, trace};

/// Sector where the anchor normally lives
pub const ANCHOR_SECTOR: u64 = 256;

/// Sector some mastering tools use for the anchor
pub const EARLY_ANCHOR_SECTOR: u64 = 32;

/// How deep descriptor sequences may point into further sequences
pub const MAX_SEQUENCE_NESTING: usize = 16;

/// Sectors probed for an anchor in an image of `total_sectors`
///
/// 32, 256, last - 256 and last, without duplicates.
pub fn anchor_candidates(total_sectors: u64) -> Vec<u64> {
    let mut candidates = vec![EARLY_ANCHOR_SECTOR, ANCHOR_SECTOR];
    if let Some(last) = total_sectors.checked_sub(1) {
        if let Some(before_last) = last.checked_sub(ANCHOR_SECTOR) {
            candidates.push(before_last);
        }
        candidates.push(last);
    }
    let mut seen = HashSet::new();
    candidates.retain(|sector| seen.insert(*sector));
    candidates
}

/// Sectors holding a valid anchor
///
/// An anchor is valid when its tag is an anchor pointer, checksums, and
/// records the sector it was found at. An empty result means no UDF.
pub fn probe<S: ImageSource + ?Sized>(source: &mut S) -> Result<Vec<u64>> {
    let length = source.len()?;
    let mut anchors = Vec::new();
    for sector in anchor_candidates(length / SECTOR_SIZE as u64) {
        let offset = sector_to_byte(sector);
        if offset + Tag::LENGTH as u64 > length {
            continue;
        }
        let mut raw = [0u8; Tag::LENGTH];
        source.read_exact_at(offset, &mut raw)?;
        if Tag::is_valid_at(&raw, Tag::ANCHOR_POINTER, sector) {
            trace!(sector, "valid UDF anchor");
            anchors.push(sector);
        }
    }
    Ok(anchors)
}

struct SequenceWalk<'s, S: ImageSource + ?Sized> {
    source: &'s mut S,
    descriptors: Vec<Descriptor>,
    visited: HashSet<u64>,
}

impl<'s, S: ImageSource + ?Sized> SequenceWalk<'s, S> {
    /// Read descriptors from `start` until the byte offset `stop`
    ///
    /// With no `stop` only the descriptor at `start` is read.
    fn walk(&mut self, start: u64, stop: Option<u64>, depth: usize) -> Result<()> {
        if depth > MAX_SEQUENCE_NESTING || !self.visited.insert(start) {
            return Err(UdfFormatError::DescriptorLoop { sector: start }.into());
        }

        let mut sector = start;
        loop {
            let (tag, raw) = tag::read_descriptor(self.source, sector)?;
            if let Some(descriptor) = Descriptor::parse(&tag, &raw, sector)? {
                trace!(sector, tag = tag.identifier, "volume descriptor");
                let next = descriptor.continuation();
                self.descriptors.push(descriptor);
                if let Some(extent) = next {
                    self.walk(extent.location as u64, Some(extent.end_byte()), depth + 1)?;
                }
            }
            match stop {
                Some(stop) if sector_to_byte(sector + 1) < stop => sector += 1,
                _ => break,
            }
        }
        Ok(())
    }
}

/// A UDF volume: its anchors and every descriptor reachable from them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdfVolume {
    anchors: Vec<u64>,
    descriptors: Vec<Descriptor>,
}

impl UdfVolume {
    /// Probe for anchors and walk the descriptor sequences of the first one
    pub fn open<S: ImageSource + ?Sized>(source: &mut S) -> Result<Self> {
        let anchors = probe(source)?;
        let Some(&anchor) = anchors.first() else {
            return Err(UdfFormatError::NoAnchor.into());
        };

        let mut walk = SequenceWalk {
            source,
            descriptors: Vec::new(),
            visited: HashSet::new(),
        };
        walk.walk(anchor, None, 0)?;
        let descriptors = walk.descriptors;
        debug!(anchor, count = descriptors.len(), "walked UDF descriptor sequences");

        Ok(Self {
            anchors,
            descriptors,
        })
    }

    /// Sectors holding a valid anchor
    pub fn anchors(&self) -> &[u64] {
        &self.anchors
    }

    /// Descriptors in the order they were read
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Partition descriptors in the order they were read
    pub fn partitions(&self) -> Vec<&PartitionDescriptor> {
        self.descriptors
            .iter()
            .filter_map(|d| match d {
                Descriptor::Partition(pd) => Some(pd),
                _ => None,
            })
            .collect()
    }

    /// First logical volume descriptor
    pub fn logical_volume(&self) -> Option<&LogicalVolume> {
        self.descriptors.iter().find_map(|d| match d {
            Descriptor::LogicalVolume(lvd) => Some(lvd),
            _ => None,
        })
    }

    /// First primary volume descriptor
    pub fn primary_volume(&self) -> Option<&PrimaryVolume> {
        self.descriptors.iter().find_map(|d| match d {
            Descriptor::PrimaryVolume(pvd) => Some(pvd),
            _ => None,
        })
    }

    /// Build the file tree of the volume's file set
    pub fn build_tree<S: ImageSource + ?Sized>(&self, source: &mut S) -> Result<FileTree> {
        directory::build_tree(source, &self.partitions())
    }
}
