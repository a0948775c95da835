//! Error handling for the xBase table engine
//!
//! Every failure surfaces as a [`DbfError`]. The [`ErrorKind`] of an error
//! identifies which class of problem occurred without matching on messages.

use thiserror::Error;

/// Error classes reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Duplicate or invalid field definition
    Schema,
    /// Record ordinal outside the table
    Range,
    /// Unknown field name or index
    FieldReference,
    /// Value not representable in the field's type or width
    TypeMismatch,
    /// Malformed or truncated file contents
    Format,
    /// Invalid engine configuration
    Config,
    /// Underlying I/O failure
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::Schema => "schema error",
            ErrorKind::Range => "range error",
            ErrorKind::FieldReference => "field reference error",
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::Format => "format error",
            ErrorKind::Config => "configuration error",
            ErrorKind::Io => "I/O error",
        })
    }
}

/// Main error type for the xBase engine
#[derive(Error, Debug)]
pub enum DbfError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Record {id} out of range (table holds {count} records)")]
    Range { id: usize, count: usize },

    #[error("Unknown field: {0}")]
    FieldReference(String),

    #[error("Type mismatch in field {field}: {reason}")]
    TypeMismatch { field: String, reason: String },

    #[error("Invalid file format: {0}")]
    Format(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DbfError {
    /// Get the error class for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DbfError::Schema(_) => ErrorKind::Schema,
            DbfError::Range { .. } => ErrorKind::Range,
            DbfError::FieldReference(_) => ErrorKind::FieldReference,
            DbfError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            DbfError::Format(_) => ErrorKind::Format,
            DbfError::Config(_) => ErrorKind::Config,
            DbfError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn mismatch(field: &str, reason: impl Into<String>) -> Self {
        DbfError::TypeMismatch {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for table operations
pub type DbfResult<T> = Result<T, DbfError>;
