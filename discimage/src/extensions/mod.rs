//! ISO9660 extensions
//!
//! Joliet needs no record-level support (its names are detected by the
//! zero-byte rule when decoding identifiers); Rock Ridge lives in each
//! record's system use area.

pub mod rock_ridge;
