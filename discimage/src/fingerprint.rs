//! Content fingerprints
//!
//! A fingerprint is an MD5 digest over a handful of fixed-size samples,
//! rendered as a `|`-separated string that records every parameter needed
//! to recompute it:
//!
//! ```text
//! I1|<sector size>|<samples>|<image length>|<md5>
//! F1|<sector size>|<samples>|<size>|<sector>|<full path>|<md5>
//! ```
//!
//! A caller that kept both strings from an earlier parse can fetch a file
//! with [`resolve`] without rebuilding the tree. Any mismatch gives `None`
//! and the caller falls back to a full parse.

use crate::error::{Error, Result};
use crate::file::reader::ExtentReader;
use crate::source::ImageSource;
use crate::tree::Node;
use crate::types::SECTOR_SIZE;
use core::fmt;
use core::str::FromStr;
use tracing::debug;

/// Samples hashed for an image fingerprint
pub const IMAGE_SAMPLE_COUNT: usize = 10;

/// Samples hashed for a file fingerprint
pub const FILE_SAMPLE_COUNT: usize = 4;

/// Largest sample size accepted from a parsed fingerprint
const MAX_SAMPLE_SIZE: usize = 1024 * 1024;

const IMAGE_VERSION: &str = "I1";
const FILE_VERSION: &str = "F1";

/// Fingerprint of a whole image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFingerprint {
    /// Sector size, also the size of each sample
    pub sector_size: usize,

    /// Number of samples
    pub sample_count: usize,

    /// Image length in bytes
    pub length: u64,

    /// Lowercase hex MD5
    pub digest: String,
}

/// Fingerprint of one file inside an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFingerprint {
    /// Sector size, also the size of each sample
    pub sector_size: usize,

    /// Number of samples
    pub sample_count: usize,

    /// File size in bytes
    pub size: u64,

    /// Absolute starting sector
    pub sector: u64,

    /// Full `/`-separated path; may itself contain `|`
    pub path: String,

    /// Lowercase hex MD5 over the path bytes and the samples
    pub digest: String,
}

impl fmt::Display for ImageFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{IMAGE_VERSION}|{}|{}|{}|{}",
            self.sector_size, self.sample_count, self.length, self.digest
        )
    }
}

impl fmt::Display for FileFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{FILE_VERSION}|{}|{}|{}|{}|{}|{}",
            self.sector_size, self.sample_count, self.size, self.sector, self.path, self.digest
        )
    }
}

fn invalid(s: &str) -> Error {
    Error::InvalidFingerprint(s.to_string())
}

fn parse_field<T: FromStr>(field: &str, whole: &str) -> Result<T> {
    field.parse().map_err(|_| invalid(whole))
}

fn check_sampling(sector_size: usize, sample_count: usize, whole: &str) -> Result<()> {
    if sector_size == 0 || sector_size > MAX_SAMPLE_SIZE || sample_count == 0 {
        return Err(invalid(whole));
    }
    Ok(())
}

/// Byte offset of a file window, `None` if the window does not fit in `u64`
fn window_start(sector: u64, sector_size: usize, size: u64) -> Option<u64> {
    let start = sector.checked_mul(sector_size as u64)?;
    start.checked_add(size)?;
    Some(start)
}

fn parse_digest(field: &str, whole: &str) -> Result<String> {
    if field.len() != 32 || !field.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid(whole));
    }
    Ok(field.to_ascii_lowercase())
}

impl FromStr for ImageFingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.split('|').collect();
        let [version, sector_size, sample_count, length, digest] = fields[..] else {
            return Err(invalid(s));
        };
        if version != IMAGE_VERSION {
            return Err(invalid(s));
        }
        let sector_size = parse_field(sector_size, s)?;
        let sample_count = parse_field(sample_count, s)?;
        check_sampling(sector_size, sample_count, s)?;
        Ok(Self {
            sector_size,
            sample_count,
            length: parse_field(length, s)?,
            digest: parse_digest(digest, s)?,
        })
    }
}

impl FromStr for FileFingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.splitn(6, '|').collect();
        let [version, sector_size, sample_count, size, sector, tail] = fields[..] else {
            return Err(invalid(s));
        };
        if version != FILE_VERSION {
            return Err(invalid(s));
        }
        // The path may contain '|', the digest never does
        let (path, digest) = tail.rsplit_once('|').ok_or_else(|| invalid(s))?;

        let sector_size = parse_field(sector_size, s)?;
        let sample_count = parse_field(sample_count, s)?;
        check_sampling(sector_size, sample_count, s)?;
        let size = parse_field(size, s)?;
        let sector = parse_field(sector, s)?;
        window_start(sector, sector_size, size).ok_or_else(|| invalid(s))?;
        Ok(Self {
            sector_size,
            sample_count,
            size,
            sector,
            path: path.to_string(),
            digest: parse_digest(digest, s)?,
        })
    }
}

/// Hash `count` samples of `sample_size` bytes spread over the window
///
/// Sample `i` starts at `i * (len / count + 1)`; samples are clamped to the
/// window and offsets at or past its end are skipped.
fn hash_samples<S: ImageSource + ?Sized>(
    hasher: &mut md5::Context,
    reader: &mut ExtentReader<'_, S>,
    count: usize,
    sample_size: usize,
) -> Result<()> {
    let length = reader.window_len();
    let step = length / count as u64 + 1;
    let mut sample = vec![0u8; sample_size];

    for i in 0..count as u64 {
        let offset = i * step;
        if offset >= length {
            break;
        }
        reader.seek(offset)?;
        let mut filled = 0;
        while filled < sample.len() {
            let read = reader.read(&mut sample[filled..])?;
            if read == 0 {
                break;
            }
            filled += read;
        }
        hasher.consume(&sample[..filled]);
    }
    Ok(())
}

fn image_digest<S: ImageSource + ?Sized>(
    source: &mut S,
    sector_size: usize,
    sample_count: usize,
) -> Result<ImageFingerprint> {
    let length = source.len()?;
    let mut hasher = md5::Context::new();
    let mut reader = ExtentReader::new(source, 0, length);
    hash_samples(&mut hasher, &mut reader, sample_count, sector_size)?;
    Ok(ImageFingerprint {
        sector_size,
        sample_count,
        length,
        digest: format!("{:x}", hasher.compute()),
    })
}

fn file_digest<S: ImageSource + ?Sized>(
    source: &mut S,
    sector_size: usize,
    sample_count: usize,
    size: u64,
    sector: u64,
    path: &str,
) -> Result<String> {
    let start = window_start(sector, sector_size, size)
        .ok_or_else(|| Error::InvalidFingerprint(format!("{path}: sector {sector} size {size}")))?;
    let mut hasher = md5::Context::new();
    hasher.consume(path.as_bytes());
    let mut reader = ExtentReader::new(source, start, size);
    hash_samples(&mut hasher, &mut reader, sample_count, sector_size)?;
    Ok(format!("{:x}", hasher.compute()))
}

/// Fingerprint a whole image
pub fn image_fingerprint<S: ImageSource + ?Sized>(source: &mut S) -> Result<ImageFingerprint> {
    image_digest(source, SECTOR_SIZE, IMAGE_SAMPLE_COUNT)
}

/// Fingerprint one node of a parsed tree
pub fn file_fingerprint<S: ImageSource + ?Sized>(source: &mut S, node: &Node) -> Result<FileFingerprint> {
    let path = node.path().to_string();
    let digest = file_digest(
        source,
        SECTOR_SIZE,
        FILE_SAMPLE_COUNT,
        node.size(),
        node.sector(),
        &path,
    )?;
    Ok(FileFingerprint {
        sector_size: SECTOR_SIZE,
        sample_count: FILE_SAMPLE_COUNT,
        size: node.size(),
        sector: node.sector(),
        path,
        digest,
    })
}

/// Stream a file straight from recorded fingerprints
///
/// The image fingerprint is recomputed first; if it still matches, the file
/// fingerprint is recomputed from its own recorded size, sector and path.
/// Only when both match is a stream over the file returned. Malformed
/// fingerprint strings are an error, mismatches are `Ok(None)`.
pub fn resolve_stream<'a, S: ImageSource + ?Sized>(
    source: &'a mut S,
    image: &str,
    file: &str,
) -> Result<Option<ExtentReader<'a, S>>> {
    let recorded_image: ImageFingerprint = image.parse()?;
    let recorded_file: FileFingerprint = file.parse()?;

    let current = image_digest(source, recorded_image.sector_size, recorded_image.sample_count)?;
    if current != recorded_image {
        debug!(recorded = %recorded_image, current = %current, "image fingerprint changed");
        return Ok(None);
    }

    let digest = file_digest(
        source,
        recorded_file.sector_size,
        recorded_file.sample_count,
        recorded_file.size,
        recorded_file.sector,
        &recorded_file.path,
    )?;
    if digest != recorded_file.digest {
        debug!(path = %recorded_file.path, "file fingerprint changed");
        return Ok(None);
    }

    let start = window_start(recorded_file.sector, recorded_file.sector_size, recorded_file.size)
        .ok_or_else(|| invalid(file))?;
    Ok(Some(ExtentReader::new(source, start, recorded_file.size)))
}

/// Read a file straight from recorded fingerprints
///
/// See [`resolve_stream`].
pub fn resolve<S: ImageSource + ?Sized>(source: &mut S, image: &str, file: &str) -> Result<Option<Vec<u8>>> {
    match resolve_stream(source, image, file)? {
        Some(mut reader) => Ok(Some(reader.read_remaining()?)),
        None => Ok(None),
    }
}
