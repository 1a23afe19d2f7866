//! Date/time parsing
//!
//! ISO9660 has two datetime formats: 7-byte binary (directory records) and
//! 17-byte ASCII (volume descriptors). UDF uses a 12-byte timestamp.
//! Values are decoded as-is; no calendar validation happens here.

use crate::utils::bytes;

/// 7-byte directory record datetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTime7 {
    /// Years since 1900
    pub year: u8,

    /// Month (1-12)
    pub month: u8,

    /// Day (1-31)
    pub day: u8,

    /// Hour (0-23)
    pub hour: u8,

    /// Minute (0-59)
    pub minute: u8,

    /// Second (0-59)
    pub second: u8,

    /// GMT offset in 15-minute intervals (-48 to +52)
    pub gmt_offset: i8,
}

impl DateTime7 {
    /// Parse from 7-byte array
    pub fn from_bytes(bytes: &[u8; 7]) -> Self {
        Self {
            year: bytes[0],
            month: bytes[1],
            day: bytes[2],
            hour: bytes[3],
            minute: bytes[4],
            second: bytes[5],
            gmt_offset: bytes[6] as i8,
        }
    }

    /// Get full year (1900 + year)
    pub fn full_year(&self) -> u16 {
        1900 + self.year as u16
    }
}

/// 17-byte ASCII datetime (volume descriptors)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime17 {
    /// Year (4 ASCII digits)
    pub year: u16,

    /// Month (2 ASCII digits, 1-12)
    pub month: u8,

    /// Day (2 ASCII digits, 1-31)
    pub day: u8,

    /// Hour (2 ASCII digits, 0-23)
    pub hour: u8,

    /// Minute (2 ASCII digits, 0-59)
    pub minute: u8,

    /// Second (2 ASCII digits, 0-59)
    pub second: u8,

    /// Hundredths (2 ASCII digits)
    pub hundredths: u8,

    /// GMT offset in 15-minute intervals
    pub gmt_offset: i8,
}

impl DateTime17 {
    /// Parse from 17-byte ASCII string
    ///
    /// Returns `None` for the "not specified" form (all digits zero) or for
    /// non-digit content.
    pub fn from_bytes(bytes: &[u8; 17]) -> Option<Self> {
        fn digits(raw: &[u8]) -> Option<u16> {
            raw.iter().try_fold(0u16, |acc, &b| {
                b.is_ascii_digit().then(|| acc * 10 + (b - b'0') as u16)
            })
        }

        let year = digits(&bytes[0..4])?;
        if year == 0 {
            return None;
        }
        Some(Self {
            year,
            month: digits(&bytes[4..6])? as u8,
            day: digits(&bytes[6..8])? as u8,
            hour: digits(&bytes[8..10])? as u8,
            minute: digits(&bytes[10..12])? as u8,
            second: digits(&bytes[12..14])? as u8,
            hundredths: digits(&bytes[14..16])? as u8,
            gmt_offset: bytes[16] as i8,
        })
    }
}

/// UDF 12-byte timestamp (ECMA-167 1/7.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UdfTimestamp {
    /// Timezone offset in minutes from UTC, if specified
    pub tz_offset: Option<i16>,

    /// Year (1-9999)
    pub year: i16,

    /// Month (1-12)
    pub month: u8,

    /// Day (1-31)
    pub day: u8,

    /// Hour (0-23)
    pub hour: u8,

    /// Minute (0-59)
    pub minute: u8,

    /// Second (0-59)
    pub second: u8,

    /// Centiseconds
    pub centiseconds: u8,

    /// Hundreds of microseconds
    pub hundreds_of_microseconds: u8,

    /// Microseconds
    pub microseconds: u8,
}

impl UdfTimestamp {
    /// Parse from the 12-byte on-disk form
    pub fn from_bytes(raw: &[u8]) -> Self {
        let type_and_zone = bytes::le_u16(raw, 0);
        // Low 12 bits are a signed minute offset; -2047 means unspecified
        let zone = ((type_and_zone & 0x0FFF) << 4) as i16 >> 4;
        Self {
            tz_offset: (zone != -2047).then_some(zone),
            year: bytes::le_u16(raw, 2) as i16,
            month: bytes::u8_at(raw, 4),
            day: bytes::u8_at(raw, 5),
            hour: bytes::u8_at(raw, 6),
            minute: bytes::u8_at(raw, 7),
            second: bytes::u8_at(raw, 8),
            centiseconds: bytes::u8_at(raw, 9),
            hundreds_of_microseconds: bytes::u8_at(raw, 10),
            microseconds: bytes::u8_at(raw, 11),
        }
    }
}
