//! Byte, string, date and sector helpers shared by the ISO9660 and UDF layers

pub mod bytes;
pub mod checksum;
pub mod datetime;
pub mod sector;
pub mod string;
