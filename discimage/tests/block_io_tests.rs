//! Block device source tests

mod common;

use common::{Entry, IsoBuilder, MemoryBlockDevice, UdfBuilder};
use discimage::{BlockDeviceSource, Error, ImageReader, ImageSource, Settings};
use gpt_disk_io::BlockIo;
use gpt_disk_types::Lba;

#[test]
fn test_memory_block_device() {
    let mut device = MemoryBlockDevice::new(vec![0u8; 10 * 2048]);
    assert_eq!(device.block_size().to_u32(), 2048);
    assert_eq!(device.num_blocks().unwrap(), 10);

    let mut buffer = [0u8; 2048];
    assert!(device.read_blocks(Lba(10), &mut buffer).is_err());
}

#[test]
fn test_unaligned_reads() {
    let data: Vec<u8> = (0..8 * 512).map(|i| (i % 251) as u8).collect();
    let device = MemoryBlockDevice::with_block_size(data.clone(), 512);
    let mut source = BlockDeviceSource::new(device, 0);

    assert_eq!(source.len().unwrap(), 4096);
    let mut buffer = vec![0u8; 1500];
    assert_eq!(source.read_at(300, &mut buffer).unwrap(), 1500);
    assert_eq!(buffer, &data[300..1800]);

    // Clamped at the end of the device
    assert_eq!(source.read_at(4000, &mut buffer).unwrap(), 96);
    assert_eq!(&buffer[..96], &data[4000..]);
    assert_eq!(source.read_at(5000, &mut buffer).unwrap(), 0);
}

#[test]
fn test_image_inside_partition() {
    let image = IsoBuilder::new()
        .primary(vec![Entry::dir("DIR", vec![Entry::file("FILE.TXT;1", b"ABCD")])])
        .build();

    // 512-byte device, image starts at LBA 64
    let mut disk = vec![0xEEu8; 64 * 512];
    disk.extend_from_slice(&image);
    let device = MemoryBlockDevice::with_block_size(disk, 512);

    let mut reader = ImageReader::new(BlockDeviceSource::new(device, 64));
    assert_eq!(
        reader.detect().unwrap(),
        Settings::Iso {
            rock_ridge: false,
            table: 0
        }
    );
    let tree = reader.tree().unwrap();
    let node = tree.node(tree.find("/DIR/FILE.TXT").unwrap());
    assert_eq!(reader.read_bytes(node).unwrap(), b"ABCD");
    assert_eq!(reader.into_inner().get_ref().block_size, 512);
}

#[test]
fn test_udf_on_block_device() {
    let built = UdfBuilder::new(vec![Entry::file("LONG.TXT", b"LONG\n")]).build();
    let mut reader = ImageReader::new(BlockDeviceSource::new(MemoryBlockDevice::new(built.data), 0));
    assert_eq!(reader.detect().unwrap(), Settings::Udf);
    let tree = reader.tree().unwrap();
    let node = tree.node(tree.find("/LONG.TXT").unwrap());
    assert_eq!(reader.read_bytes(node).unwrap(), b"LONG\n");
}

#[test]
fn test_device_errors_surface() {
    struct Failing;

    impl BlockIo for Failing {
        type Error = &'static str;

        fn block_size(&self) -> gpt_disk_types::BlockSize {
            gpt_disk_types::BlockSize::BS_512
        }

        fn num_blocks(&mut self) -> Result<u64, Self::Error> {
            Ok(1024)
        }

        fn read_blocks(&mut self, _start_lba: Lba, _dst: &mut [u8]) -> Result<(), Self::Error> {
            Err("media removed")
        }

        fn write_blocks(&mut self, _start_lba: Lba, _src: &[u8]) -> Result<(), Self::Error> {
            Err("read only")
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    let mut reader = ImageReader::new(BlockDeviceSource::new(Failing, 0));
    match reader.detect() {
        Err(Error::BlockIo { message, .. }) => assert!(message.contains("media removed")),
        other => panic!("expected block I/O error, got {other:?}"),
    }
}
