//! .dbf file reading and writing
//!
//! A file is laid out strictly in order:
//! - 32-byte preamble ([`TableHeader`])
//! - one 32-byte descriptor per field, then the 0x0D terminator
//! - `record_count` records of `record_length` bytes (status byte + fields)
//! - an optional 0x1A end-of-file marker
//!
//! Loading parses the whole image before anything is returned, so a
//! malformed file never yields a partially populated table.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::error::{DbfError, DbfResult};

use super::field::FieldDescriptor;
use super::header::TableHeader;
use super::record::{RecordStatus, RecordStore};
use super::schema::Schema;

/// Everything a .dbf file holds
#[derive(Debug, Clone)]
pub struct TableImage {
    pub header: TableHeader,
    pub schema: Schema,
    pub records: RecordStore,
}

/// Serialize a table to any writer
pub fn write_table<W: Write>(
    writer: &mut W,
    header: &TableHeader,
    schema: &Schema,
    records: &RecordStore,
) -> DbfResult<()> {
    writer.write_all(&header.to_bytes())?;
    for field in schema.fields() {
        writer.write_all(&field.to_bytes())?;
    }
    writer.write_all(&[TableHeader::TERMINATOR])?;

    for (_, status, data) in records.iter() {
        writer.write_all(&[status.marker()])?;
        writer.write_all(data)?;
    }
    writer.write_all(&[TableHeader::EOF_MARKER])?;
    writer.flush()?;
    Ok(())
}

/// Read a whole table image from any reader
pub fn read_table<R: Read>(reader: &mut R) -> DbfResult<TableImage> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    parse_table(&data)
}

/// Parse a table image from bytes
pub fn parse_table(data: &[u8]) -> DbfResult<TableImage> {
    let header = TableHeader::from_bytes(data)?;
    let header_length = header.header_length as usize;
    if data.len() < header_length {
        return Err(DbfError::Format(format!(
            "File truncated inside header ({} of {} bytes)",
            data.len(),
            header_length
        )));
    }

    let schema = parse_descriptors(&data[..header_length])?;
    if schema.record_length() != header.record_length as usize {
        return Err(DbfError::Format(format!(
            "Record length {} does not match field widths ({})",
            header.record_length,
            schema.record_length()
        )));
    }

    let record_length = header.record_length as usize;
    let count = header.record_count as usize;
    let end = count
        .checked_mul(record_length)
        .and_then(|len| len.checked_add(header_length))
        .ok_or_else(|| DbfError::Format("Record count overflows file size".into()))?;
    if data.len() < end {
        return Err(DbfError::Format(format!(
            "File truncated: {} records need {} bytes, found {}",
            count,
            end,
            data.len()
        )));
    }

    let mut records = RecordStore::new(schema.field_data_len());
    for id in 1..=count {
        let start = header.record_offset(id);
        let raw = &data[start..start + record_length];
        let status = RecordStatus::from_marker(raw[0]).ok_or_else(|| {
            DbfError::Format(format!("Record {} has invalid status byte 0x{:02X}", id, raw[0]))
        })?;
        records.append(&raw[1..], status);
    }

    match data.get(end) {
        None | Some(&TableHeader::EOF_MARKER) => {}
        Some(_) => tracing::warn!("Ignoring {} bytes after the last record", data.len() - end),
    }

    Ok(TableImage {
        header,
        schema,
        records,
    })
}

fn parse_descriptors(header_area: &[u8]) -> DbfResult<Schema> {
    let mut schema = Schema::new();
    let mut pos = TableHeader::SIZE;
    loop {
        match header_area.get(pos) {
            None => return Err(DbfError::Format("Missing field descriptor terminator".into())),
            Some(&TableHeader::TERMINATOR) => break,
            Some(_) => {}
        }
        let block = header_area
            .get(pos..pos + FieldDescriptor::SIZE)
            .ok_or_else(|| DbfError::Format(format!("Field descriptor {} truncated", schema.len() + 1)))?;
        let field = FieldDescriptor::from_bytes(block)?;
        schema.push(field).map_err(|e| DbfError::Format(e.to_string()))?;
        pos += FieldDescriptor::SIZE;
    }

    if pos + 1 < header_area.len() {
        tracing::debug!("Skipping {} bytes of header padding", header_area.len() - pos - 1);
    }
    Ok(schema)
}

/// Write a table to a file, replacing any existing file
pub fn save(path: &Path, header: &TableHeader, schema: &Schema, records: &RecordStore) -> DbfResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_table(&mut writer, header, schema, records)?;
    tracing::debug!(
        "Saved {:?}: {} fields, {} records",
        path,
        schema.len(),
        records.len()
    );
    Ok(())
}

/// Load a table from a file
pub fn load(path: &Path) -> DbfResult<TableImage> {
    let data = std::fs::read(path)?;
    let image = parse_table(&data)?;
    tracing::debug!(
        "Loaded {:?}: {} fields, {} records",
        path,
        image.schema.len(),
        image.records.len()
    );
    Ok(image)
}
