//! Error types for disc image operations

use thiserror::Error;

/// Result type for disc image operations
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur while reading a disc image
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying image source
    #[error("I/O error reading image: {0}")]
    Io(#[from] std::io::Error),

    /// Block device read failed
    #[error("block device read failed at LBA {lba}: {message}")]
    BlockIo {
        /// Logical block that failed
        lba: u64,
        /// Device error rendered as text
        message: String,
    },

    /// Neither a UDF anchor nor an ISO9660 table of contents was found
    #[error("no UDF or ISO9660 file system found in image")]
    NoFileSystem,

    /// Settings string could not be parsed
    #[error("invalid settings string: {0:?}")]
    InvalidSettings(String),

    /// Requested table of contents does not exist
    #[error("table of contents {index} out of range ({count} found)")]
    TableOutOfRange {
        /// Requested index
        index: usize,
        /// Number of descriptors found
        count: usize,
    },

    /// Chosen volume descriptor carries no root directory
    #[error("volume descriptor {index} has no root directory")]
    NoRootDirectory {
        /// Descriptor index
        index: usize,
    },

    /// Directory tree refers back to a directory already being walked
    #[error("directory cycle detected at sector {sector}")]
    DirectoryCycle {
        /// Sector that was visited twice
        sector: u64,
    },

    /// Directory nesting exceeds the supported depth
    #[error("directory nesting exceeds {depth} levels")]
    DirectoryTooDeep {
        /// Depth bound that was hit
        depth: usize,
    },

    /// Stream seek beyond the end of its extent
    #[error("seek to {offset} beyond extent length {length}")]
    SeekOutOfRange {
        /// Requested offset
        offset: u64,
        /// Extent length
        length: u64,
    },

    /// Fingerprint string could not be parsed
    #[error("invalid fingerprint: {0:?}")]
    InvalidFingerprint(String),

    /// Fatal UDF structure error
    #[error("UDF format error: {0}")]
    Udf(#[from] UdfFormatError),
}

/// Fatal inconsistencies in UDF structures
///
/// Unlike ISO9660 descriptor mismatches these abort the parse: once a
/// tagged descriptor sequence is out of sync nothing after it can be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UdfFormatError {
    /// No valid Anchor Volume Descriptor Pointer at any probe location
    #[error("no valid anchor volume descriptor pointer")]
    NoAnchor,

    /// Descriptor sequence contains an unrecognised tag
    #[error("unknown descriptor tag {tag} at sector {sector}")]
    UnknownDescriptor {
        /// Tag identifier read
        tag: u16,
        /// Sector it was read from
        sector: u64,
    },

    /// A specific descriptor type was required but another was found
    #[error("expected tag {expected} at sector {sector}, found {found}")]
    UnexpectedTag {
        /// Tag identifier required
        expected: u16,
        /// Tag identifier read
        found: u16,
        /// Sector it was read from
        sector: u64,
    },

    /// File entry type other than directory or regular file
    #[error("unsupported file type {file_type} at sector {sector}")]
    UnsupportedFileType {
        /// ICB file type
        file_type: u8,
        /// Sector of the file entry
        sector: u64,
    },

    /// Allocation refers to a partition with no descriptor
    #[error("reference to unknown partition {0}")]
    UnknownPartition(u16),

    /// Partitions were scanned without finding a File Set Descriptor
    #[error("no file set descriptor found")]
    NoFileSet,

    /// Descriptor sequence extents reference each other
    #[error("descriptor sequence loops at sector {sector}")]
    DescriptorLoop {
        /// Extent start visited twice
        sector: u64,
    },
}
