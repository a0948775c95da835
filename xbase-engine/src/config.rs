//! Defaults used when a schema is derived from a row type
//!
//! ```toml
//! text_width = 50
//! integer_width = 20
//! float_width = 20
//! float_decimals = 8
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::{DbfError, DbfResult};

/// Column widths for derived schemas
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableConfig {
    /// Width of text columns
    pub text_width: u8,
    /// Width of integer columns
    pub integer_width: u8,
    /// Width of floating point columns
    pub float_width: u8,
    /// Decimals of floating point columns
    pub float_decimals: u8,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            text_width: 50,
            integer_width: 20,
            float_width: 20,
            float_decimals: 8,
        }
    }
}

impl TableConfig {
    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> DbfResult<Self> {
        toml::from_str(text).map_err(|e| DbfError::Config(e.to_string()))
    }

    /// Read a TOML config file
    pub fn from_file(path: &Path) -> DbfResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = TableConfig::from_toml_str("text_width = 12\n").unwrap();
        assert_eq!(config.text_width, 12);
        assert_eq!(config.integer_width, 20);
        assert_eq!(config.float_decimals, 8);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(TableConfig::from_toml_str("").unwrap(), TableConfig::default());
    }

    #[test]
    fn test_invalid_document() {
        let err = TableConfig::from_toml_str("text_width = \"wide\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(TableConfig::from_toml_str("page_size = 4").is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"float_width = 12\nfloat_decimals = 4\n").unwrap();
        let config = TableConfig::from_file(file.path()).unwrap();
        assert_eq!(config.float_width, 12);
        assert_eq!(config.float_decimals, 4);
    }
}
