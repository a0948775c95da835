//! Table header - the 32-byte preamble of a .dbf file
//!
//! Layout of the dBase III preamble:
//! - Offset 0x00: version byte
//! - Offset 0x01: last update, YY MM DD (year stored as year - 1900)
//! - Offset 0x04: number of records (u32)
//! - Offset 0x08: header length in bytes (u16)
//! - Offset 0x0A: record length in bytes (u16)
//! - Offset 0x0C: reserved (20 bytes)
//!
//! Field descriptors follow, then the 0x0D terminator.

use byteorder::{LittleEndian, ReadBytesExt};
use chrono::{Datelike, NaiveDate};
use std::io::Cursor;

use crate::error::{DbfError, DbfResult};

bitflags::bitflags! {
    /// Bits of the version byte
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VersionFlags: u8 {
        /// Format level (3 for dBase III)
        const LEVEL = 0x07;
        /// dBase IV memo file present
        const DBASE4_MEMO = 0x08;
        /// dBase IV SQL table
        const SQL = 0x70;
        /// .DBT memo file present
        const MEMO = 0x80;
    }
}

/// Header metadata of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    /// Version byte
    pub version: u8,
    /// Date of last update
    pub last_update: NaiveDate,
    /// Number of records, live and deleted
    pub record_count: u32,
    /// Bytes before the first record
    pub header_length: u16,
    /// Bytes per record including the status byte
    pub record_length: u16,
}

impl TableHeader {
    /// Size of the preamble
    pub const SIZE: usize = 32;

    /// Version byte written by this engine (dBase III without memo)
    pub const DBASE3: u8 = 0x03;

    /// Byte closing the field descriptor array
    pub const TERMINATOR: u8 = 0x0D;

    /// End-of-file marker after the last record
    pub const EOF_MARKER: u8 = 0x1A;

    /// Create a header with the current date
    pub fn new(record_count: u32, header_length: u16, record_length: u16) -> Self {
        TableHeader {
            version: Self::DBASE3,
            last_update: chrono::Local::now().date_naive(),
            record_count,
            header_length,
            record_length,
        }
    }

    /// Parse the 32-byte preamble
    pub fn from_bytes(data: &[u8]) -> DbfResult<Self> {
        if data.len() < Self::SIZE {
            return Err(DbfError::Format("Header too short".into()));
        }

        let version = data[0];
        let flags = VersionFlags::from_bits_retain(version);
        let level = (flags & VersionFlags::LEVEL).bits();
        if !(3..=5).contains(&level) {
            return Err(DbfError::Format(format!("Unsupported version byte 0x{:02X}", version)));
        }
        if flags.intersects(VersionFlags::MEMO | VersionFlags::DBASE4_MEMO) {
            tracing::warn!("Version byte 0x{:02X} announces a memo file, which is ignored", version);
        }

        let last_update = NaiveDate::from_ymd_opt(1900 + data[1] as i32, data[2] as u32, data[3] as u32)
            .unwrap_or_else(|| {
                tracing::warn!(
                    "Invalid last update date {:02}-{:02}-{:02} in header",
                    data[1],
                    data[2],
                    data[3]
                );
                NaiveDate::default()
            });

        let mut cursor = Cursor::new(&data[4..12]);
        let record_count = cursor.read_u32::<LittleEndian>()?;
        let header_length = cursor.read_u16::<LittleEndian>()?;
        let record_length = cursor.read_u16::<LittleEndian>()?;

        if (header_length as usize) < Self::SIZE + 1 {
            return Err(DbfError::Format(format!("Header length {} too small", header_length)));
        }
        if record_length == 0 {
            return Err(DbfError::Format("Record length is zero".into()));
        }

        Ok(TableHeader {
            version,
            last_update,
            record_count,
            header_length,
            record_length,
        })
    }

    /// Serialize the 32-byte preamble
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = self.version;
        buf[1] = (self.last_update.year() - 1900).clamp(0, u8::MAX as i32) as u8;
        buf[2] = self.last_update.month() as u8;
        buf[3] = self.last_update.day() as u8;

        buf[4..8].copy_from_slice(&self.record_count.to_le_bytes());
        buf[8..10].copy_from_slice(&self.header_length.to_le_bytes());
        buf[10..12].copy_from_slice(&self.record_length.to_le_bytes());

        // Bytes 12-31 reserved
        buf
    }

    /// Byte offset of the status byte of record `id` (1-based)
    pub fn record_offset(&self, id: usize) -> usize {
        self.header_length as usize + (id - 1) * self.record_length as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let mut header = TableHeader::new(5, 161, 60);
        header.last_update = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();

        let bytes = header.to_bytes();
        assert_eq!(bytes[0], 0x03);
        assert_eq!(&bytes[1..4], &[124, 3, 9]);
        assert_eq!(&bytes[4..8], &5u32.to_le_bytes());
        assert_eq!(&bytes[8..10], &161u16.to_le_bytes());
        assert_eq!(&bytes[10..12], &60u16.to_le_bytes());

        let parsed = TableHeader::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut bytes = TableHeader::new(0, 33, 1).to_bytes();
        bytes[0] = 0x02;
        assert!(TableHeader::from_bytes(&bytes).is_err());
        bytes[0] = 0x83;
        assert!(TableHeader::from_bytes(&bytes).is_ok());
    }

    #[test]
    fn test_rejects_short_header() {
        let bytes = TableHeader::new(0, 33, 1).to_bytes();
        let err = TableHeader::from_bytes(&bytes[..20]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
    }

    #[test]
    fn test_record_offset() {
        let header = TableHeader::new(3, 97, 12);
        assert_eq!(header.record_offset(1), 97);
        assert_eq!(header.record_offset(3), 121);
    }

    #[test]
    fn test_version_flags() {
        let flags = VersionFlags::from_bits_retain(0x83);
        assert!(flags.contains(VersionFlags::MEMO));
        assert_eq!((flags & VersionFlags::LEVEL).bits(), 3);
    }
}
