//! Common types and constants shared by the ISO9660 and UDF layers

/// Logical sector size (always 2048 bytes for optical media)
pub const SECTOR_SIZE: usize = 2048;

/// ISO9660 volume descriptor set starts at sector 16
pub const VOLUME_DESCRIPTOR_START: u64 = 16;

/// Maximum directory depth walked before giving up
pub const MAX_DIRECTORY_DEPTH: usize = 64;

/// ISO9660 volume descriptor type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VolumeDescriptorType {
    /// Boot Record (El Torito)
    BootRecord = 0,
    /// Primary Volume Descriptor
    Primary = 1,
    /// Supplementary/Enhanced Volume Descriptor (Joliet)
    Enhanced = 2,
    /// Volume Partition Descriptor
    Partition = 3,
    /// Volume Descriptor Set Terminator
    Terminator = 255,
}

impl VolumeDescriptorType {
    /// Decode a descriptor type byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::BootRecord),
            1 => Some(Self::Primary),
            2 => Some(Self::Enhanced),
            3 => Some(Self::Partition),
            255 => Some(Self::Terminator),
            _ => None,
        }
    }

    /// Whether descriptors of this type carry a root directory record
    pub fn has_root(self) -> bool {
        matches!(self, Self::Primary | Self::Enhanced)
    }
}
