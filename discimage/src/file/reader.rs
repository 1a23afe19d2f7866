//! Bounded extent stream
//!
//! [`ExtentReader`] exposes the byte window `[start, start + length)` of an
//! image as a seekable stream without buffering the file. Reads clamp at
//! the window end and report end of data instead of running past it.

use crate::error::{Error, Result};
use crate::file::extent::Extent;
use crate::source::ImageSource;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Chunk size used by [`ExtentReader::transfer_to`]
const TRANSFER_CHUNK: usize = 64 * 1024;

/// Seekable reader over one extent of an image
///
/// The reader borrows the source mutably; each concurrent reader needs its
/// own source handle.
pub struct ExtentReader<'a, S: ImageSource + ?Sized> {
    source: &'a mut S,
    start: u64,
    length: u64,
    position: u64,
}

impl<'a, S: ImageSource + ?Sized> ExtentReader<'a, S> {
    /// Reader over `length` bytes starting at absolute byte `start`
    pub fn new(source: &'a mut S, start: u64, length: u64) -> Self {
        Self {
            source,
            start,
            length,
            position: 0,
        }
    }

    /// Reader over an extent
    pub fn from_extent(source: &'a mut S, extent: Extent) -> Self {
        Self::new(source, extent.byte_offset(), extent.length)
    }

    /// Read bytes from current position
    ///
    /// Returns number of bytes read (0 at end of the window).
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let to_read = buffer.len().min(self.available() as usize);
        if to_read == 0 {
            return Ok(0);
        }
        let read = self
            .source
            .read_at(self.start + self.position, &mut buffer[..to_read])?;
        self.position += read as u64;
        Ok(read)
    }

    /// Read one byte, `None` at end of the window
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Skip forward, clamped to the window; returns bytes skipped
    pub fn skip(&mut self, count: u64) -> u64 {
        let skipped = count.min(self.available());
        self.position += skipped;
        skipped
    }

    /// Bytes left before the window end
    pub fn available(&self) -> u64 {
        self.length.saturating_sub(self.position)
    }

    /// Seek to absolute position inside the window
    ///
    /// Seeking to the end is allowed; past the end is an error.
    pub fn seek(&mut self, position: u64) -> Result<()> {
        if position > self.length {
            return Err(Error::SeekOutOfRange {
                offset: position,
                length: self.length,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Go back to the start of the window
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Copy everything from the current position to `sink`
    ///
    /// Returns bytes written. An image that ends inside the window is an
    /// `UnexpectedEof` I/O error.
    pub fn transfer_to<W: Write + ?Sized>(&mut self, sink: &mut W) -> Result<u64> {
        let mut chunk = vec![0u8; TRANSFER_CHUNK.min(self.available() as usize).max(1)];
        let mut total = 0u64;
        loop {
            let read = self.read(&mut chunk)?;
            if read == 0 {
                if !self.is_eof() {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "image ends {} bytes before the end of the extent",
                            self.available()
                        ),
                    )));
                }
                break;
            }
            sink.write_all(&chunk[..read])?;
            total += read as u64;
        }
        Ok(total)
    }

    /// Read the rest of the window into a vector
    pub fn read_remaining(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::with_capacity(self.available() as usize);
        self.transfer_to(&mut data)?;
        Ok(data)
    }

    /// Get current position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Window length
    pub fn window_len(&self) -> u64 {
        self.length
    }

    /// Zero-length window
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Check if at end of the window
    pub fn is_eof(&self) -> bool {
        self.position >= self.length
    }
}

fn to_io_error(error: Error) -> io::Error {
    match error {
        Error::Io(e) => e,
        Error::SeekOutOfRange { .. } => io::Error::new(io::ErrorKind::InvalidInput, error),
        other => io::Error::other(other),
    }
}

impl<'a, S: ImageSource + ?Sized> Read for ExtentReader<'a, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        ExtentReader::read(self, buf).map_err(to_io_error)
    }
}

impl<'a, S: ImageSource + ?Sized> Seek for ExtentReader<'a, S> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => self.length.checked_add_signed(delta),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of extent")
        })?;
        ExtentReader::seek(self, target).map_err(to_io_error)?;
        Ok(target)
    }
}
