//! Binding of row type fields to schema columns
//!
//! A [`RowBinding`] is computed once per row type and schema. It records,
//! for each mapped field that has a matching column, where the value lives
//! in [`TableRow::values`], which column it maps to, and whether the field
//! is stored blank when it holds its zero value.

use crate::config::TableConfig;
use crate::error::{DbfError, DbfResult};
use crate::storage::codec::{self, Value};
use crate::storage::field::FieldType;
use crate::storage::schema::Schema;

use super::row::{ColumnDef, TableRow, ValueKind};

/// Parsed binding directive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directive {
    /// Explicit column name
    pub column: Option<String>,
    /// Store the blank encoding when the value is zero
    pub omit_empty: bool,
    /// Field is not mapped at all
    pub skip: bool,
}

impl Directive {
    /// Parse `"COLUMN[,omitempty]"`, `",omitempty"` or `"-"`
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim();
        if tag == "-" {
            return Directive {
                skip: true,
                ..Default::default()
            };
        }

        let mut parts = tag.split(',');
        let column = parts
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let mut omit_empty = false;
        for option in parts {
            match option.trim() {
                "omitempty" => omit_empty = true,
                "" => {}
                other => tracing::debug!("Ignoring unknown binding option {:?}", other),
            }
        }
        Directive {
            column,
            omit_empty,
            skip: false,
        }
    }

    pub fn of(column: &ColumnDef) -> Self {
        column.tag.map(Directive::parse).unwrap_or_default()
    }

    /// Column name this field binds to
    pub fn column_name(&self, field: &str) -> String {
        self.column
            .clone()
            .unwrap_or_else(|| field.to_string())
            .to_ascii_uppercase()
    }
}

/// One field bound to one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundColumn {
    /// Rust field name
    pub field: &'static str,
    /// Position in `TableRow::values()`
    pub value_index: usize,
    /// Position in the schema
    pub column: usize,
    pub omit_empty: bool,
}

/// Field-to-column mapping for one row type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowBinding {
    pub columns: Vec<BoundColumn>,
}

impl RowBinding {
    /// Bind the fields of `R` to the columns of `schema` by name.
    /// Fields without a column, and columns without a field, are skipped.
    pub fn build<R: TableRow>(schema: &Schema) -> Self {
        let mut columns = Vec::new();
        for (value_index, def) in R::columns().into_iter().enumerate() {
            let directive = Directive::of(&def);
            if directive.skip {
                continue;
            }
            let name = directive.column_name(def.field);
            match schema.index_of(&name) {
                Some(column) => columns.push(BoundColumn {
                    field: def.field,
                    value_index,
                    column,
                    omit_empty: directive.omit_empty,
                }),
                None => tracing::debug!(
                    "Field {} of {} has no column {}",
                    def.field,
                    std::any::type_name::<R>(),
                    name
                ),
            }
        }
        RowBinding { columns }
    }

    /// Encode every bound field of `row`. Nothing is written here, so a
    /// failure leaves the record untouched.
    pub fn encode<R: TableRow>(&self, schema: &Schema, row: &R) -> DbfResult<Vec<(usize, Vec<u8>)>> {
        let values = row.values();
        self.columns
            .iter()
            .map(|bound| -> DbfResult<(usize, Vec<u8>)> {
                let field = schema.field(bound.column)?;
                let value = values.get(bound.value_index).ok_or_else(|| {
                    DbfError::Schema(format!(
                        "{} returned no value for field {}",
                        std::any::type_name::<R>(),
                        bound.field
                    ))
                })?;
                let bytes = if bound.omit_empty && value.is_zero() {
                    codec::blank(field)
                } else {
                    codec::encode_value(field, value)?
                };
                Ok((field.offset, bytes))
            })
            .collect()
    }

    /// Decode the bound columns of a record's field data into `row`
    pub fn decode<R: TableRow>(&self, schema: &Schema, data: &[u8], row: &mut R) -> DbfResult<()> {
        let decoded = self
            .columns
            .iter()
            .map(|bound| -> DbfResult<(&'static str, Value)> {
                let field = schema.field(bound.column)?;
                Ok((bound.field, codec::decode_value(field, &data[field.span()])?))
            })
            .collect::<DbfResult<Vec<(&'static str, Value)>>>()?;

        for ((name, value), bound) in decoded.into_iter().zip(&self.columns) {
            row.assign(name, value).map_err(|reason| {
                let column = schema
                    .field(bound.column)
                    .map(|f| f.name.as_str())
                    .unwrap_or(name);
                DbfError::mismatch(column, reason)
            })?;
        }
        Ok(())
    }
}

/// Derive a schema from the mapped fields of `R`
pub fn derive_schema<R: TableRow>(config: &TableConfig) -> DbfResult<Schema> {
    let mut schema = Schema::new();
    for def in R::columns() {
        let directive = Directive::of(&def);
        if directive.skip {
            continue;
        }
        let name = directive.column_name(def.field);
        let (field_type, width, decimals) = match def.kind {
            ValueKind::Logical => (FieldType::Logical, 1, 0),
            ValueKind::Character => (FieldType::Character, config.text_width, 0),
            ValueKind::Integer => (FieldType::Numeric, config.integer_width, 0),
            ValueKind::Float => (FieldType::Float, config.float_width, config.float_decimals),
            ValueKind::Date => (FieldType::Date, 8, 0),
        };
        schema.add(&name, field_type, width, decimals)?;
    }
    tracing::debug!(
        "Derived {} columns from {}",
        schema.len(),
        std::any::type_name::<R>()
    );
    Ok(schema)
}
