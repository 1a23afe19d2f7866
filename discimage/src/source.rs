//! Random-access byte sources
//!
//! Every parser in this crate reads through [`ImageSource`]: absolute offset
//! in, bytes out. Files and in-memory cursors get it through the blanket
//! `Read + Seek` impl; block devices go through [`BlockDeviceSource`].

use crate::error::{Error, Result};
use crate::types::SECTOR_SIZE;
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;
use std::io::{self, Read, Seek, SeekFrom};

/// Random-access, read-only view of a disc image
///
/// Reads move the source's position, so one source must not be shared by
/// concurrent readers. Open a separate handle per reader instead.
pub trait ImageSource {
    /// Total image length in bytes
    fn len(&mut self) -> Result<u64>;

    /// Read up to `buf.len()` bytes at an absolute offset
    ///
    /// Returns fewer bytes only at the end of the media.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// True for zero-length images
    fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Fill `buf` completely, surfacing a short read as an I/O error
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let read = self.read_at(offset, buf)?;
        if read < buf.len() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "short read at offset {offset}: wanted {} bytes, got {read}",
                    buf.len()
                ),
            )));
        }
        Ok(())
    }

    /// Read one whole logical sector
    fn read_sector(&mut self, sector: u64, buf: &mut [u8; SECTOR_SIZE]) -> Result<()> {
        self.read_exact_at(sector * SECTOR_SIZE as u64, buf)
    }
}

impl<T: Read + Seek> ImageSource for T {
    fn len(&mut self) -> Result<u64> {
        let current = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        if current != end {
            self.seek(SeekFrom::Start(current))?;
        }
        Ok(end)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }
}

/// Exposes a [`BlockIo`] device as an [`ImageSource`]
///
/// `start_lba` is the device block where the image begins, so an image
/// stored inside a partition can be read in place. Reads that do not line
/// up with device blocks go through a one-block cache.
pub struct BlockDeviceSource<B: BlockIo> {
    block_io: B,
    start_lba: u64,
    block_size: usize,
    num_blocks: Option<u64>,
    cache: Vec<u8>,
    cached_lba: Option<u64>,
}

impl<B: BlockIo> BlockDeviceSource<B> {
    /// Wrap a block device whose image starts at `start_lba`
    pub fn new(block_io: B, start_lba: u64) -> Self {
        let block_size = block_io.block_size().to_u64() as usize;
        Self {
            block_io,
            start_lba,
            block_size,
            num_blocks: None,
            cache: vec![0u8; block_size],
            cached_lba: None,
        }
    }

    /// Borrow the underlying device
    pub fn get_ref(&self) -> &B {
        &self.block_io
    }

    /// Give the device back
    pub fn into_inner(self) -> B {
        self.block_io
    }

    fn blocks(&mut self) -> Result<u64> {
        if let Some(n) = self.num_blocks {
            return Ok(n);
        }
        let total = self.block_io.num_blocks().map_err(|e| Error::BlockIo {
            lba: 0,
            message: format!("{e:?}"),
        })?;
        let n = total.saturating_sub(self.start_lba);
        self.num_blocks = Some(n);
        Ok(n)
    }

    fn load(&mut self, lba: u64) -> Result<()> {
        if self.cached_lba == Some(lba) {
            return Ok(());
        }
        let device_lba = self.start_lba + lba;
        self.cached_lba = None;
        self.block_io
            .read_blocks(Lba(device_lba), &mut self.cache)
            .map_err(|e| Error::BlockIo {
                lba: device_lba,
                message: format!("{e:?}"),
            })?;
        self.cached_lba = Some(lba);
        Ok(())
    }
}

impl<B: BlockIo> ImageSource for BlockDeviceSource<B> {
    fn len(&mut self) -> Result<u64> {
        Ok(self.blocks()? * self.block_size as u64)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let total = self.len()?;
        if offset >= total {
            return Ok(0);
        }
        let wanted = buf.len().min((total - offset) as usize);
        let block_size = self.block_size as u64;

        let mut done = 0;
        while done < wanted {
            let position = offset + done as u64;
            let lba = position / block_size;
            let within = (position % block_size) as usize;
            let chunk = (self.block_size - within).min(wanted - done);

            // Whole aligned blocks bypass the cache
            if within == 0 && chunk == self.block_size {
                let whole = (wanted - done) / self.block_size;
                let end = done + whole * self.block_size;
                let device_lba = self.start_lba + lba;
                self.block_io
                    .read_blocks(Lba(device_lba), &mut buf[done..end])
                    .map_err(|e| Error::BlockIo {
                        lba: device_lba,
                        message: format!("{e:?}"),
                    })?;
                done = end;
                continue;
            }

            self.load(lba)?;
            buf[done..done + chunk].copy_from_slice(&self.cache[within..within + chunk]);
            done += chunk;
        }
        Ok(done)
    }
}
