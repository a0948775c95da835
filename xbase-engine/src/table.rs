//! Table facade
//!
//! A [`Table`] owns its schema, its records and the header metadata derived
//! from them. Rows are addressed by 1-based record ids that stay valid for
//! the life of the table; deleted rows keep their id and their data.

use parking_lot::RwLock;
use std::any::TypeId;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::TableConfig;
use crate::cursor::Cursor;
use crate::error::{DbfError, DbfResult};
use crate::mapping::{derive_schema, RowBinding, TableRow};
use crate::storage::codec;
use crate::storage::field::{FieldDescriptor, FieldType};
use crate::storage::file::{self, TableImage};
use crate::storage::header::TableHeader;
use crate::storage::record::{RecordStatus, RecordStore};
use crate::storage::schema::Schema;

/// An in-memory xBase table
#[derive(Debug)]
pub struct Table {
    schema: Schema,
    records: RecordStore,
    last_update: NaiveDate,
    config: TableConfig,
    /// Field bindings per row type, valid for the current schema
    bindings: RwLock<HashMap<TypeId, Arc<RowBinding>>>,
}

impl Default for Table {
    fn default() -> Self {
        Table::new()
    }
}

impl Table {
    /// Empty table with an empty schema
    pub fn new() -> Self {
        Table::with_config(TableConfig::default())
    }

    /// Empty table whose derived schemas use `config`
    pub fn with_config(config: TableConfig) -> Self {
        Table {
            schema: Schema::new(),
            records: RecordStore::new(0),
            last_update: today(),
            config,
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// Table whose schema is derived from the mapped fields of `R`
    pub fn create<R: TableRow>() -> DbfResult<Self> {
        Table::create_with::<R>(TableConfig::default())
    }

    /// Like [`Table::create`], with explicit column width defaults
    pub fn create_with<R: TableRow>(config: TableConfig) -> DbfResult<Self> {
        let schema = derive_schema::<R>(&config)?;
        let mut table = Table::with_config(config);
        table.records = RecordStore::new(schema.field_data_len());
        table.schema = schema;
        Ok(table)
    }

    // ---- schema ----

    fn add_field(&mut self, name: &str, field_type: FieldType, width: u8, decimals: u8) -> DbfResult<usize> {
        if !self.records.is_empty() {
            return Err(DbfError::Schema(format!(
                "Cannot add field {} to a table that already holds records",
                name
            )));
        }
        let index = self.schema.add(name, field_type, width, decimals)?;
        self.records = RecordStore::new(self.schema.field_data_len());
        self.bindings.write().clear();
        self.touch();
        Ok(index)
    }

    /// Add a one-byte logical field
    pub fn add_boolean_field(&mut self, name: &str) -> DbfResult<usize> {
        self.add_field(name, FieldType::Logical, 1, 0)
    }

    /// Add a character field of `width` bytes
    pub fn add_text_field(&mut self, name: &str, width: u8) -> DbfResult<usize> {
        self.add_field(name, FieldType::Character, width, 0)
    }

    /// Add a numeric field without decimals
    pub fn add_int_field(&mut self, name: &str, width: u8) -> DbfResult<usize> {
        self.add_field(name, FieldType::Numeric, width, 0)
    }

    /// Add a floating point field
    pub fn add_float_field(&mut self, name: &str, width: u8, decimals: u8) -> DbfResult<usize> {
        self.add_field(name, FieldType::Float, width, decimals)
    }

    /// Add a fixed-point numeric field
    pub fn add_numeric_field(&mut self, name: &str, width: u8, decimals: u8) -> DbfResult<usize> {
        self.add_field(name, FieldType::Numeric, width, decimals)
    }

    /// Add an 8-byte date field
    pub fn add_date_field(&mut self, name: &str) -> DbfResult<usize> {
        self.add_field(name, FieldType::Date, 8, 0)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        self.schema.fields()
    }

    /// Case-insensitive field lookup
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.schema.index_of(name)
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    // ---- header ----

    /// Header as it would be written now. Always dBase III: memo files
    /// announced by a loaded header are never written back.
    pub fn header(&self) -> TableHeader {
        TableHeader {
            version: TableHeader::DBASE3,
            last_update: self.last_update,
            record_count: self.records.len() as u32,
            header_length: self.schema.header_length() as u16,
            record_length: self.schema.record_length() as u16,
        }
    }

    /// Records, live and deleted
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn live_count(&self) -> usize {
        self.records.live_count()
    }

    fn touch(&mut self) {
        self.last_update = today();
    }

    // ---- records ----

    /// Append a blank live record and return its id
    pub fn add_record(&mut self) -> usize {
        let template = vec![b' '; self.schema.field_data_len()];
        let id = self.records.append(&template, RecordStatus::Live);
        self.touch();
        tracing::trace!("Added record {}", id);
        id
    }

    /// Append a record holding `row`. Nothing is added if `row` cannot be encoded.
    pub fn append<R: TableRow>(&mut self, row: &R) -> DbfResult<usize> {
        let encoded = self.binding::<R>().encode(&self.schema, row)?;
        let id = self.add_record();
        for (offset, bytes) in encoded {
            self.records.write(id, offset, &bytes)?;
        }
        Ok(id)
    }

    /// Mark a record deleted. Its id and data are kept.
    pub fn delete(&mut self, id: usize) -> DbfResult<()> {
        self.records.delete(id)?;
        self.touch();
        tracing::trace!("Deleted record {}", id);
        Ok(())
    }

    pub fn is_deleted(&self, id: usize) -> DbfResult<bool> {
        self.records.is_deleted(id)
    }

    /// Set field `index` of record `id` from text
    pub fn set_field_value(&mut self, id: usize, index: usize, value: &str) -> DbfResult<()> {
        self.records.status(id)?;
        let field = self.schema.field(index)?;
        let bytes = codec::encode_text(field, value)?;
        let offset = field.offset;
        self.records.write(id, offset, &bytes)?;
        self.touch();
        Ok(())
    }

    /// Set the named field of record `id` from text
    pub fn set_field_value_by_name(&mut self, id: usize, name: &str, value: &str) -> DbfResult<()> {
        let index = self
            .schema
            .index_of(name)
            .ok_or_else(|| DbfError::FieldReference(name.to_string()))?;
        self.set_field_value(id, index, value)
    }

    /// Text of field `index` of record `id`
    pub fn field_value(&self, id: usize, index: usize) -> DbfResult<String> {
        let data = self.records.get(id)?;
        let field = self.schema.field(index)?;
        Ok(codec::decode_text(field, &data[field.span()]))
    }

    pub fn field_value_by_name(&self, id: usize, name: &str) -> DbfResult<String> {
        let data = self.records.get(id)?;
        let (_, field) = self.schema.field_by_name(name)?;
        Ok(codec::decode_text(field, &data[field.span()]))
    }

    /// Text of every field of record `id`, in schema order
    pub fn row(&self, id: usize) -> DbfResult<Vec<String>> {
        let data = self.records.get(id)?;
        Ok(self
            .schema
            .fields()
            .iter()
            .map(|field| codec::decode_text(field, &data[field.span()]))
            .collect())
    }

    /// Overwrite the mapped fields of record `id` with `row`
    pub fn write<R: TableRow>(&mut self, id: usize, row: &R) -> DbfResult<()> {
        self.records.status(id)?;
        let encoded = self.binding::<R>().encode(&self.schema, row)?;
        for (offset, bytes) in encoded {
            self.records.write(id, offset, &bytes)?;
        }
        self.touch();
        tracing::trace!("Wrote record {}", id);
        Ok(())
    }

    /// Decode record `id` into the mapped fields of `row`
    pub fn read<R: TableRow>(&self, id: usize, row: &mut R) -> DbfResult<()> {
        let data = self.records.get(id)?;
        self.binding::<R>().decode(&self.schema, data, row)
    }

    /// Binding of `R` to the current schema, built on first use
    fn binding<R: TableRow>(&self) -> Arc<RowBinding> {
        let key = TypeId::of::<R>();
        if let Some(binding) = self.bindings.read().get(&key) {
            return Arc::clone(binding);
        }
        let binding = Arc::new(RowBinding::build::<R>(&self.schema));
        self.bindings.write().insert(key, Arc::clone(&binding));
        binding
    }

    pub(crate) fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Cursor over the live records, positioned before the first
    pub fn new_iterator(&self) -> Cursor<'_> {
        Cursor::new(self)
    }

    // ---- persistence ----

    /// Write the table to `path`, replacing the file
    pub fn save_file(&self, path: impl AsRef<Path>) -> DbfResult<()> {
        file::save(path.as_ref(), &self.header(), &self.schema, &self.records)
    }

    /// Load a table from `path`
    pub fn load_file(path: impl AsRef<Path>) -> DbfResult<Table> {
        file::load(path.as_ref()).map(Table::from_image)
    }

    /// Serialize the table to a writer
    pub fn write_to<W: Write>(&self, writer: &mut W) -> DbfResult<()> {
        file::write_table(writer, &self.header(), &self.schema, &self.records)
    }

    /// Read a table from a reader
    pub fn read_from<R: Read>(reader: &mut R) -> DbfResult<Table> {
        file::read_table(reader).map(Table::from_image)
    }

    fn from_image(image: TableImage) -> Table {
        Table {
            schema: image.schema,
            records: image.records,
            last_update: image.header.last_update,
            config: TableConfig::default(),
            bindings: RwLock::new(HashMap::new()),
        }
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
