//! xBase Engine - dBase III compatible table engine
//!
//! This crate reads, edits and writes fixed-record `.dbf` tables. Rows can be
//! accessed field by field as text, or as whole Rust structs that implement
//! [`TableRow`] (usually through the [`table_row!`] macro).

pub mod error;
pub mod config;
pub mod storage;
pub mod mapping;
pub mod table;
pub mod cursor;

pub use error::{DbfError, DbfResult, ErrorKind};
pub use config::TableConfig;
pub use storage::{FieldDescriptor, FieldType, TableHeader, Value};
pub use mapping::{ColumnValue, TableRow};
pub use table::Table;
pub use cursor::{Cursor, CursorState};
