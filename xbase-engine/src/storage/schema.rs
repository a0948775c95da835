//! Ordered column layout of a table
//!
//! The schema assigns contiguous offsets to its fields in declaration order.
//! A record is one status byte followed by the field data, so the on-disk
//! record length is `1 + field_data_len()`.

use crate::error::{DbfError, DbfResult};

use super::field::{FieldDescriptor, FieldType};

/// Ordered set of field descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
    data_len: usize,
}

impl Schema {
    /// Most fields a dBase III header can describe
    pub const MAX_FIELDS: usize = 255;

    pub fn new() -> Self {
        Schema::default()
    }

    /// Append a field, assigning it the next offset
    pub fn push(&mut self, mut field: FieldDescriptor) -> DbfResult<usize> {
        if self.fields.iter().any(|f| f.matches(&field.name)) {
            return Err(DbfError::Schema(format!("Duplicate field name {}", field.name)));
        }
        if self.fields.len() >= Self::MAX_FIELDS {
            return Err(DbfError::Schema(format!(
                "A table cannot hold more than {} fields",
                Self::MAX_FIELDS
            )));
        }
        if 1 + self.data_len + field.width as usize > u16::MAX as usize {
            return Err(DbfError::Schema("Record length exceeds 65535 bytes".into()));
        }

        field.offset = self.data_len;
        self.data_len += field.width as usize;
        self.fields.push(field);
        Ok(self.fields.len() - 1)
    }

    /// Convenience wrapper that validates and appends in one step
    pub fn add(&mut self, name: &str, field_type: FieldType, width: u8, decimals: u8) -> DbfResult<usize> {
        self.push(FieldDescriptor::new(name, field_type, width, decimals)?)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> DbfResult<&FieldDescriptor> {
        self.fields
            .get(index)
            .ok_or_else(|| DbfError::FieldReference(format!("#{}", index)))
    }

    /// Case-insensitive lookup of a field's position
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.matches(name))
    }

    pub fn field_by_name(&self, name: &str) -> DbfResult<(usize, &FieldDescriptor)> {
        let index = self
            .index_of(name)
            .ok_or_else(|| DbfError::FieldReference(name.to_string()))?;
        Ok((index, &self.fields[index]))
    }

    /// Bytes of field data per record (status byte excluded)
    pub fn field_data_len(&self) -> usize {
        self.data_len
    }

    /// Full record length including the status byte
    pub fn record_length(&self) -> usize {
        1 + self.data_len
    }

    /// Header length for this schema: preamble, descriptors and terminator
    pub fn header_length(&self) -> usize {
        super::header::TableHeader::SIZE + self.fields.len() * FieldDescriptor::SIZE + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        let mut schema = Schema::new();
        schema.add("boolean", FieldType::Logical, 1, 0).unwrap();
        schema.add("text", FieldType::Character, 40, 0).unwrap();
        schema.add("int", FieldType::Numeric, 10, 0).unwrap();
        schema.add("float", FieldType::Float, 8, 6).unwrap();
        schema
    }

    #[test]
    fn test_offsets_are_contiguous() {
        let schema = sample();
        let offsets: Vec<usize> = schema.fields().iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 1, 41, 51]);
        assert_eq!(schema.field_data_len(), 59);
        assert_eq!(schema.record_length(), 60);
        assert_eq!(schema.header_length(), 32 + 4 * 32 + 1);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut schema = sample();
        let err = schema.add("TEXT", FieldType::Character, 5, 0).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Schema);
        assert_eq!(schema.len(), 4);
    }

    #[test]
    fn test_lookup() {
        let schema = sample();
        assert_eq!(schema.index_of("Float"), Some(3));
        assert_eq!(schema.index_of("missing"), None);
        let err = schema.field_by_name("missing").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::FieldReference);
        assert!(schema.field(4).is_err());
    }
}
