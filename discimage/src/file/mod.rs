//! File reading and extent management

pub mod extent;
pub mod reader;

use crate::error::Result;
use crate::source::ImageSource;
use extent::Extent;
use tracing::trace;

/// Read file contents
///
/// # Arguments
/// * `source` - Image to read from
/// * `extent` - Extent of the file
/// * `buffer` - Buffer to read into, at least `extent.length` bytes
///
/// # Returns
/// Number of bytes read
pub fn read_file<S: ImageSource + ?Sized>(
    source: &mut S,
    extent: Extent,
    buffer: &mut [u8],
) -> Result<usize> {
    let size = extent.length as usize;
    let available = buffer.len();
    let target = buffer.get_mut(..size).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("buffer of {available} bytes too small for {size} byte file"),
        )
    })?;
    trace!(sector = extent.sector, size, "reading file");
    source.read_exact_at(extent.byte_offset(), target)?;
    Ok(size)
}

/// Read file into new Vec
pub fn read_file_vec<S: ImageSource + ?Sized>(source: &mut S, extent: Extent) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; extent.length as usize];
    read_file(source, extent, &mut buffer)?;
    Ok(buffer)
}
