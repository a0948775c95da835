//! Mapping between Rust structs and table rows

pub mod row;
pub mod binding;

pub use row::{kind_of, ColumnDef, ColumnValue, TableRow, ValueKind};
pub use binding::{derive_schema, Directive, RowBinding};
