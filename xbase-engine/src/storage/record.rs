//! Record storage for xBase tables
//!
//! Records live in a single append-only arena of field data with a parallel
//! status vector. Record ids are 1-based positions in the arena; deleting a
//! record only flips its status, so ids are never reused or renumbered.

use crate::error::{DbfError, DbfResult};

/// Visibility of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Live,
    Deleted,
}

impl RecordStatus {
    /// Status byte marking a live record on disk
    pub const LIVE_MARKER: u8 = b' ';
    /// Status byte marking a deleted record on disk
    pub const DELETED_MARKER: u8 = b'*';

    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            Self::LIVE_MARKER => Some(RecordStatus::Live),
            Self::DELETED_MARKER => Some(RecordStatus::Deleted),
            _ => None,
        }
    }

    pub fn marker(&self) -> u8 {
        match self {
            RecordStatus::Live => Self::LIVE_MARKER,
            RecordStatus::Deleted => Self::DELETED_MARKER,
        }
    }
}

/// Fixed-width record arena
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    /// Bytes of field data per record
    width: usize,
    /// Field data of every record, back to back
    data: Vec<u8>,
    /// Status of each record, indexed by id - 1
    status: Vec<RecordStatus>,
}

impl RecordStore {
    pub fn new(width: usize) -> Self {
        RecordStore {
            width,
            data: Vec::new(),
            status: Vec::new(),
        }
    }

    /// Field data bytes per record
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of records, live and deleted
    pub fn len(&self) -> usize {
        self.status.len()
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }

    /// Number of live records
    pub fn live_count(&self) -> usize {
        self.status.iter().filter(|s| **s == RecordStatus::Live).count()
    }

    /// Append a record initialised from `template`, returning its id
    pub fn append(&mut self, template: &[u8], status: RecordStatus) -> usize {
        debug_assert_eq!(template.len(), self.width);
        self.data.extend_from_slice(template);
        self.status.push(status);
        self.status.len()
    }

    fn slot(&self, id: usize) -> DbfResult<usize> {
        if id == 0 || id > self.status.len() {
            return Err(DbfError::Range {
                id,
                count: self.status.len(),
            });
        }
        Ok(id - 1)
    }

    pub fn status(&self, id: usize) -> DbfResult<RecordStatus> {
        Ok(self.status[self.slot(id)?])
    }

    /// Mark a record deleted. Deleting twice is a no-op.
    pub fn delete(&mut self, id: usize) -> DbfResult<()> {
        let slot = self.slot(id)?;
        self.status[slot] = RecordStatus::Deleted;
        Ok(())
    }

    pub fn is_deleted(&self, id: usize) -> DbfResult<bool> {
        Ok(self.status(id)? == RecordStatus::Deleted)
    }

    /// Field data of a record
    pub fn get(&self, id: usize) -> DbfResult<&[u8]> {
        let start = self.slot(id)? * self.width;
        Ok(&self.data[start..start + self.width])
    }

    /// Overwrite part of a record's field data
    pub fn write(&mut self, id: usize, offset: usize, bytes: &[u8]) -> DbfResult<()> {
        let start = self.slot(id)? * self.width + offset;
        debug_assert!(offset + bytes.len() <= self.width);
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// First live record with an id greater than `after`
    pub fn next_live(&self, after: usize) -> Option<usize> {
        self.status
            .iter()
            .enumerate()
            .skip(after)
            .find(|(_, s)| **s == RecordStatus::Live)
            .map(|(slot, _)| slot + 1)
    }

    /// Iterate `(id, status, field data)` over every record
    pub fn iter(&self) -> impl Iterator<Item = (usize, RecordStatus, &[u8])> + '_ {
        self.status
            .iter()
            .enumerate()
            .map(move |(slot, status)| {
                let start = slot * self.width;
                (slot + 1, *status, &self.data[start..start + self.width])
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_append_assigns_stable_ids() {
        let mut store = RecordStore::new(3);
        assert_eq!(store.append(b"aaa", RecordStatus::Live), 1);
        assert_eq!(store.append(b"bbb", RecordStatus::Live), 2);
        store.delete(1).unwrap();
        assert_eq!(store.append(b"ccc", RecordStatus::Live), 3);
        assert_eq!(store.get(2).unwrap(), b"bbb");
        assert_eq!(store.len(), 3);
        assert_eq!(store.live_count(), 2);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = RecordStore::new(1);
        store.append(b"x", RecordStatus::Live);
        store.delete(1).unwrap();
        store.delete(1).unwrap();
        assert!(store.is_deleted(1).unwrap());
        assert_eq!(store.get(1).unwrap(), b"x");
    }

    #[test]
    fn test_out_of_range() {
        let mut store = RecordStore::new(1);
        store.append(b"x", RecordStatus::Live);
        assert_eq!(store.get(0).unwrap_err().kind(), ErrorKind::Range);
        assert_eq!(store.delete(2).unwrap_err().kind(), ErrorKind::Range);
        assert!(store.write(5, 0, b"y").is_err());
    }

    #[test]
    fn test_write_span() {
        let mut store = RecordStore::new(5);
        store.append(b"     ", RecordStatus::Live);
        store.write(1, 2, b"ab").unwrap();
        assert_eq!(store.get(1).unwrap(), b"  ab ");
    }

    #[test]
    fn test_next_live_skips_deleted() {
        let mut store = RecordStore::new(1);
        for _ in 0..4 {
            store.append(b" ", RecordStatus::Live);
        }
        store.delete(2).unwrap();
        store.delete(3).unwrap();
        assert_eq!(store.next_live(0), Some(1));
        assert_eq!(store.next_live(1), Some(4));
        assert_eq!(store.next_live(4), None);
    }

    #[test]
    fn test_status_markers() {
        assert_eq!(RecordStatus::from_marker(b' '), Some(RecordStatus::Live));
        assert_eq!(RecordStatus::from_marker(b'*'), Some(RecordStatus::Deleted));
        assert_eq!(RecordStatus::from_marker(b'X'), None);
        assert_eq!(RecordStatus::Deleted.marker(), b'*');
    }
}
