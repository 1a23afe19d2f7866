//! Common test utilities: in-memory block device and image builders

#![allow(dead_code, unused_imports)]

pub mod builder;
pub use builder::{BuiltUdf, Entry, IsoBuilder, UdfBuilder};

use gpt_disk_io::BlockIo;
use gpt_disk_types::{BlockSize, Lba};
use std::io::{self, Cursor};

/// In-memory block device for testing
#[derive(Debug, Clone)]
pub struct MemoryBlockDevice {
    pub data: Vec<u8>,
    pub block_size: usize,
}

impl MemoryBlockDevice {
    /// Create a 2048-byte block device from raw data
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_block_size(data, 2048)
    }

    /// Create a device with another block size (hard disks use 512)
    pub fn with_block_size(data: Vec<u8>, block_size: usize) -> Self {
        Self { data, block_size }
    }

    /// Create from a file path
    pub fn from_file(path: &str) -> io::Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::new(data))
    }
}

impl BlockIo for MemoryBlockDevice {
    type Error = io::Error;

    fn block_size(&self) -> BlockSize {
        BlockSize::new(self.block_size as u32).expect("valid block size")
    }

    fn num_blocks(&mut self) -> Result<u64, Self::Error> {
        Ok((self.data.len() / self.block_size) as u64)
    }

    fn read_blocks(&mut self, start_lba: Lba, dst: &mut [u8]) -> Result<(), Self::Error> {
        let offset = start_lba.0 as usize * self.block_size;
        if offset + dst.len() > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read beyond end of device",
            ));
        }
        dst.copy_from_slice(&self.data[offset..offset + dst.len()]);
        Ok(())
    }

    fn write_blocks(&mut self, start_lba: Lba, src: &[u8]) -> Result<(), Self::Error> {
        let offset = start_lba.0 as usize * self.block_size;
        if offset + src.len() > self.data.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "write beyond end of device",
            ));
        }
        self.data[offset..offset + src.len()].copy_from_slice(src);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Image bytes as a seekable source
pub fn cursor(data: Vec<u8>) -> Cursor<Vec<u8>> {
    Cursor::new(data)
}

/// Sector `n` of an image
pub fn sector(data: &[u8], n: u64) -> &[u8] {
    let start = n as usize * 2048;
    &data[start..start + 2048]
}
