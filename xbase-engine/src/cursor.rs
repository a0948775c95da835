//! Forward cursor over the live records of a table
//!
//! A cursor starts before the first record. Each call to [`Cursor::next`]
//! moves to the next live record, skipping deleted ones. The cursor borrows
//! its table, so the table cannot be modified while a cursor is open.

use crate::error::{DbfError, DbfResult};
use crate::mapping::TableRow;
use crate::table::Table;

/// Cursor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Before the first record
    BeforeFirst,
    /// On a live record
    Positioned(usize),
    /// Past the last record
    AtEnd,
}

/// Sequential read-only cursor
#[derive(Debug)]
pub struct Cursor<'a> {
    table: &'a Table,
    state: CursorState,
}

impl<'a> Cursor<'a> {
    pub fn new(table: &'a Table) -> Self {
        Cursor {
            table,
            state: CursorState::BeforeFirst,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Advance to the next live record. Returns false once past the end.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        let after = match self.state {
            CursorState::BeforeFirst => 0,
            CursorState::Positioned(id) => id,
            CursorState::AtEnd => return false,
        };
        self.state = match self.table.records().next_live(after) {
            Some(id) => CursorState::Positioned(id),
            None => CursorState::AtEnd,
        };
        matches!(self.state, CursorState::Positioned(_))
    }

    /// Id of the current record
    pub fn record_id(&self) -> Option<usize> {
        match self.state {
            CursorState::Positioned(id) => Some(id),
            _ => None,
        }
    }

    fn current(&self) -> DbfResult<usize> {
        self.record_id().ok_or(DbfError::Range {
            id: 0,
            count: self.table.record_count(),
        })
    }

    /// Decode the current record into `row`
    pub fn read<R: TableRow>(&self, row: &mut R) -> DbfResult<()> {
        self.table.read(self.current()?, row)
    }

    /// Text of every field of the current record
    pub fn row(&self) -> DbfResult<Vec<String>> {
        self.table.row(self.current()?)
    }
}
