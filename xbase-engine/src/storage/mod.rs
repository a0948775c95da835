//! Storage layer for the .dbf file format
//!
//! This module handles the fixed-width binary layout of xBase tables:
//! - Field descriptors and the schema built from them
//! - Per-type value encoding
//! - The record arena
//! - Header and whole-file reading and writing

pub mod field;
pub mod schema;
pub mod codec;
pub mod record;
pub mod header;
pub mod file;

pub use field::{FieldDescriptor, FieldType};
pub use schema::Schema;
pub use codec::Value;
pub use record::{RecordStatus, RecordStore};
pub use header::TableHeader;
