//! ISO9660 / UDF Disc Image Reader
//!
//! Reads the file tree and file data of optical disc images without
//! mounting them.
//!
//! # Overview
//!
//! This crate provides:
//! - ISO9660 volume descriptor parsing (Primary, Enhanced/Joliet, Partition)
//! - Rock Ridge alternate names and POSIX attributes
//! - UDF anchor, descriptor sequence, partition and file set parsing
//! - One file tree model for both file systems
//! - Bounded streams over file extents
//! - Content fingerprints that let a caller re-read a file without
//!   rebuilding the tree
//!
//! # Architecture
//!
//! The implementation is layered:
//! 1. **Source layer** - random access to the image ([`ImageSource`])
//! 2. **Volume layer** - ISO9660 descriptors from sector 16, UDF anchors and
//!    descriptor sequences
//! 3. **Directory layer** - directory records / file identifiers into a
//!    [`FileTree`]
//! 4. **File layer** - extent reads and [`ExtentReader`]
//! 5. **Facade** - detection, [`Settings`] and fingerprints ([`ImageReader`])
//!
//! # Usage
//!
//! ```ignore
//! use discimage::ImageReader;
//!
//! let mut reader = ImageReader::open("disc.iso")?;
//!
//! // "1,0,0" for UDF, "0,<rock ridge>,<table>" for ISO9660
//! let settings = reader.detect()?;
//!
//! let tree = reader.tree()?;
//! if let Some(id) = tree.find("/isolinux/vmlinuz") {
//!     let kernel = reader.read_bytes(tree.node(id))?;
//! }
//! ```
//!
//! # Fingerprints
//!
//! ```ignore
//! let image_fp = reader.image_fingerprint()?.to_string();
//! let file_fp = reader.file_fingerprint(tree.node(id))?.to_string();
//!
//! // Later, against a possibly changed image
//! match reader.resolve(&image_fp, &file_fp)? {
//!     Some(bytes) => { /* unchanged */ }
//!     None => { /* rebuild the tree */ }
//! }
//! ```

#![warn(missing_docs)]

pub mod directory;
pub mod error;
pub mod extensions;
pub mod file;
pub mod fingerprint;
pub mod image;
pub mod source;
pub mod tree;
pub mod types;
pub mod udf;
pub mod utils;
pub mod volume;

pub use error::{Error, Result, UdfFormatError};
pub use file::extent::Extent;
pub use file::reader::ExtentReader;
pub use source::{BlockDeviceSource, ImageSource};
pub use tree::{FileTree, Node, NodeId, NodeKind};
pub use types::SECTOR_SIZE;

// High-level API exports
pub use fingerprint::{file_fingerprint, image_fingerprint, resolve, resolve_stream};
pub use image::{detect, ImageReader, Settings};
pub use udf::UdfVolume;
pub use volume::IsoVolume;
