//! Field descriptors for xBase tables
//!
//! Each column of a table is described by a 32-byte descriptor in the file
//! header: name, type marker, width and decimal count. In memory the
//! descriptor also carries its byte offset within the record's field data.

use crate::error::{DbfError, DbfResult};

/// Column data types supported by dBase III files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldType {
    /// Fixed-width text, space padded
    Character = b'C',
    /// ASCII number, right justified, optional decimals
    Numeric = b'N',
    /// ASCII floating point number
    Float = b'F',
    /// Single byte boolean
    Logical = b'L',
    /// YYYYMMDD date
    Date = b'D',
}

impl FieldType {
    pub fn from_raw(value: u8) -> Option<Self> {
        match value.to_ascii_uppercase() {
            b'C' => Some(FieldType::Character),
            b'N' => Some(FieldType::Numeric),
            b'F' => Some(FieldType::Float),
            b'L' => Some(FieldType::Logical),
            b'D' => Some(FieldType::Date),
            _ => None,
        }
    }

    /// Type marker byte as stored in the descriptor
    pub fn marker(&self) -> u8 {
        *self as u8
    }

    /// Whether values of this type are numbers laid out as text
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Numeric | FieldType::Float)
    }

    /// Allowed width range for this type
    pub fn width_range(&self) -> (u8, u8) {
        match self {
            FieldType::Character => (1, 254),
            FieldType::Numeric | FieldType::Float => (1, FieldDescriptor::MAX_NUMERIC_WIDTH),
            FieldType::Logical => (1, 1),
            FieldType::Date => (8, 8),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.marker() as char)
    }
}

/// Column descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Upper-cased column name
    pub name: String,
    /// Column type
    pub field_type: FieldType,
    /// Width in bytes
    pub width: u8,
    /// Digits after the decimal point (Numeric/Float only)
    pub decimals: u8,
    /// Offset from the start of the field data (the status byte is not counted)
    pub offset: usize,
}

impl FieldDescriptor {
    /// Size of a field descriptor in the file header
    pub const SIZE: usize = 32;

    /// Maximum name length (the 11th byte of the name area is a NUL)
    pub const MAX_NAME_LEN: usize = 10;

    /// Widest numeric column
    pub const MAX_NUMERIC_WIDTH: u8 = 20;

    /// Most decimals a numeric column may declare
    pub const MAX_DECIMALS: u8 = 15;

    /// Build a validated descriptor. The offset is assigned by the schema.
    pub fn new(name: &str, field_type: FieldType, width: u8, decimals: u8) -> DbfResult<Self> {
        let name = normalize_name(name).map_err(DbfError::Schema)?;
        validate_layout(&name, field_type, width, decimals).map_err(DbfError::Schema)?;
        Ok(FieldDescriptor {
            name,
            field_type,
            width,
            decimals,
            offset: 0,
        })
    }

    /// Parse a descriptor from its 32-byte header block
    pub fn from_bytes(data: &[u8]) -> DbfResult<Self> {
        if data.len() < Self::SIZE {
            return Err(DbfError::Format("Field descriptor too short".into()));
        }

        let raw_name = &data[0..11];
        let name_len = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());
        let name = std::str::from_utf8(&raw_name[..name_len])
            .map_err(|_| DbfError::Format("Field name is not ASCII".into()))?;
        let name = normalize_name(name.trim_end()).map_err(DbfError::Format)?;

        let field_type = FieldType::from_raw(data[11]).ok_or_else(|| {
            DbfError::Format(format!(
                "Field {} has unsupported type marker 0x{:02X}",
                name, data[11]
            ))
        })?;
        let width = data[16];
        let decimals = data[17];
        validate_layout(&name, field_type, width, decimals).map_err(DbfError::Format)?;

        Ok(FieldDescriptor {
            name,
            field_type,
            width,
            decimals,
            offset: 0,
        })
    }

    /// Serialize the descriptor to its 32-byte header block
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        let name = self.name.as_bytes();
        buf[..name.len()].copy_from_slice(name);
        buf[11] = self.field_type.marker();
        // Bytes 12-15: field data address, unused on disk
        buf[16] = self.width;
        buf[17] = self.decimals;
        // Bytes 18-31 reserved
        buf
    }

    /// Byte range of this field within the record's field data
    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width as usize
    }

    /// Case-insensitive name comparison
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }
}

/// Upper-case and check a column name
pub(crate) fn normalize_name(name: &str) -> Result<String, String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Field name is empty".into());
    }
    if name.len() > FieldDescriptor::MAX_NAME_LEN {
        return Err(format!(
            "Field name {:?} longer than {} characters",
            name,
            FieldDescriptor::MAX_NAME_LEN
        ));
    }
    let mut chars = name.chars();
    let first_ok = chars.next().map_or(false, |c| c.is_ascii_alphabetic());
    if !first_ok || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("Field name {:?} is not a valid identifier", name));
    }
    Ok(name.to_ascii_uppercase())
}

fn validate_layout(name: &str, field_type: FieldType, width: u8, decimals: u8) -> Result<(), String> {
    let (min, max) = field_type.width_range();
    if width < min || width > max {
        return Err(format!(
            "Field {} of type {} must be {}..={} bytes wide, got {}",
            name, field_type, min, max, width
        ));
    }
    if decimals == 0 {
        return Ok(());
    }
    if !field_type.is_numeric() {
        return Err(format!("Field {} of type {} cannot have decimals", name, field_type));
    }
    // Room for at least one digit and the point
    if decimals > FieldDescriptor::MAX_DECIMALS || decimals as usize + 2 > width as usize {
        return Err(format!(
            "Field {} cannot hold {} decimals in {} bytes",
            name, decimals, width
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_roundtrip() {
        let field = FieldDescriptor::new("price", FieldType::Numeric, 12, 2).unwrap();
        assert_eq!(field.name, "PRICE");

        let bytes = field.to_bytes();
        assert_eq!(&bytes[0..5], b"PRICE");
        assert_eq!(bytes[5], 0);
        assert_eq!(bytes[11], b'N');

        let parsed = FieldDescriptor::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, field);
    }

    #[test]
    fn test_invalid_names() {
        assert!(FieldDescriptor::new("", FieldType::Logical, 1, 0).is_err());
        assert!(FieldDescriptor::new("averyverylongname", FieldType::Logical, 1, 0).is_err());
        assert!(FieldDescriptor::new("1abc", FieldType::Logical, 1, 0).is_err());
        assert!(FieldDescriptor::new("a-b", FieldType::Logical, 1, 0).is_err());
        assert!(FieldDescriptor::new("a_b1", FieldType::Logical, 1, 0).is_ok());
    }

    #[test]
    fn test_width_limits() {
        assert!(FieldDescriptor::new("d", FieldType::Date, 10, 0).is_err());
        assert!(FieldDescriptor::new("n", FieldType::Numeric, 21, 0).is_err());
        assert!(FieldDescriptor::new("c", FieldType::Character, 0, 0).is_err());
        assert!(FieldDescriptor::new("c", FieldType::Character, 254, 0).is_ok());
        assert!(FieldDescriptor::new("f", FieldType::Float, 8, 6).is_ok());
        assert!(FieldDescriptor::new("f", FieldType::Float, 8, 7).is_err());
        assert!(FieldDescriptor::new("c", FieldType::Character, 10, 2).is_err());
    }

    #[test]
    fn test_unknown_type_marker() {
        let mut bytes = FieldDescriptor::new("memo", FieldType::Character, 10, 0)
            .unwrap()
            .to_bytes();
        bytes[11] = b'M';
        let err = FieldDescriptor::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
    }

    #[test]
    fn test_case_insensitive_match() {
        let field = FieldDescriptor::new("Boolean", FieldType::Logical, 1, 0).unwrap();
        assert!(field.matches("boolean"));
        assert!(field.matches("BOOLEAN"));
        assert!(!field.matches("bool"));
    }
}
