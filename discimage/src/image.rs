//! Image facade
//!
//! [`ImageReader`] ties the layers together: it detects which file system
//! to read, builds the tree, and reads file data. Detection produces a
//! [`Settings`] value that can be stored and handed back later to skip
//! detection.

use crate::error::{Error, Result};
use crate::file::{self, reader::ExtentReader};
use crate::fingerprint::{self, FileFingerprint, ImageFingerprint};
use crate::source::ImageSource;
use crate::tree::{FileTree, Node};
use crate::udf::{self, UdfVolume};
use crate::volume::IsoVolume;
use core::fmt;
use core::str::FromStr;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Which file system to read and how
///
/// Renders as `"<udf>,<rock ridge>,<table>"`: `"1,0,0"` for UDF, `"0,1,2"`
/// for ISO9660 table 2 with Rock Ridge names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Settings {
    /// Read the UDF file set
    Udf,

    /// Read one ISO9660 table of contents
    Iso {
        /// Name nodes by their Rock Ridge NM entry
        rock_ridge: bool,
        /// Volume descriptor index
        table: usize,
    },
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Settings::Udf => f.write_str("1,0,0"),
            Settings::Iso { rock_ridge, table } => write!(f, "0,{},{}", rock_ridge as u8, table),
        }
    }
}

impl FromStr for Settings {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidSettings(s.to_string());
        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        match fields[..] {
            ["1", ..] => Ok(Settings::Udf),
            ["0", rock_ridge, table] => {
                let rock_ridge = match rock_ridge {
                    "0" => false,
                    "1" => true,
                    _ => return Err(invalid()),
                };
                let table = table.parse().map_err(|_| invalid())?;
                Ok(Settings::Iso { rock_ridge, table })
            }
            _ => Err(invalid()),
        }
    }
}

/// Detect the file system of an image
///
/// UDF wins whenever an anchor is found; otherwise the ISO9660 table with
/// the longest names is chosen. An image with neither is
/// [`Error::NoFileSystem`].
pub fn detect<S: ImageSource + ?Sized>(source: &mut S) -> Result<Settings> {
    let anchors = udf::probe(source)?;
    if !anchors.is_empty() {
        debug!(?anchors, "UDF anchor found");
        return Ok(Settings::Udf);
    }

    let volume = IsoVolume::open(source)?;
    let choice = volume.best_table(source)?.ok_or(Error::NoFileSystem)?;
    debug!(
        table = choice.table,
        rock_ridge = choice.rock_ridge,
        score = ?choice.score,
        "chose ISO9660 table of contents"
    );
    Ok(Settings::Iso {
        rock_ridge: choice.rock_ridge,
        table: choice.table,
    })
}

/// Build the tree `settings` describe
pub fn build_tree<S: ImageSource + ?Sized>(source: &mut S, settings: Settings) -> Result<FileTree> {
    match settings {
        Settings::Udf => UdfVolume::open(source)?.build_tree(source),
        Settings::Iso { rock_ridge, table } => IsoVolume::open(source)?.build_tree(source, table, rock_ridge),
    }
}

/// Disc image reader
///
/// Owns its source; dropping the reader releases it.
pub struct ImageReader<S: ImageSource> {
    source: S,
    settings: Option<Settings>,
}

impl ImageReader<File> {
    /// Open an image file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<S: ImageSource> ImageReader<S> {
    /// Reader that detects its settings on first use
    pub fn new(source: S) -> Self {
        Self {
            source,
            settings: None,
        }
    }

    /// Reader with known settings; detection is skipped
    pub fn with_settings(source: S, settings: Settings) -> Self {
        Self {
            source,
            settings: Some(settings),
        }
    }

    /// Settings in use, detecting them if none were given
    pub fn detect(&mut self) -> Result<Settings> {
        if let Some(settings) = self.settings {
            return Ok(settings);
        }
        let settings = detect(&mut self.source)?;
        self.settings = Some(settings);
        Ok(settings)
    }

    /// Settings given or detected so far
    pub fn settings(&self) -> Option<Settings> {
        self.settings
    }

    /// Build the file tree with the reader's settings
    pub fn tree(&mut self) -> Result<FileTree> {
        let settings = self.detect()?;
        self.tree_with(settings)
    }

    /// Build the file tree with explicit settings
    pub fn tree_with(&mut self, settings: Settings) -> Result<FileTree> {
        build_tree(&mut self.source, settings)
    }

    /// Read a node's whole extent
    pub fn read_bytes(&mut self, node: &Node) -> Result<Vec<u8>> {
        file::read_file_vec(&mut self.source, node.extent())
    }

    /// Stream over a node's extent
    pub fn open_stream(&mut self, node: &Node) -> ExtentReader<'_, S> {
        ExtentReader::from_extent(&mut self.source, node.extent())
    }

    /// Fingerprint the whole image
    pub fn image_fingerprint(&mut self) -> Result<ImageFingerprint> {
        fingerprint::image_fingerprint(&mut self.source)
    }

    /// Fingerprint one node
    pub fn file_fingerprint(&mut self, node: &Node) -> Result<FileFingerprint> {
        fingerprint::file_fingerprint(&mut self.source, node)
    }

    /// Read a file from recorded fingerprints, `None` if either changed
    pub fn resolve(&mut self, image: &str, file: &str) -> Result<Option<Vec<u8>>> {
        fingerprint::resolve(&mut self.source, image, file)
    }

    /// Borrow the source
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Borrow the source mutably
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Give the source back
    pub fn into_inner(self) -> S {
        self.source
    }
}
