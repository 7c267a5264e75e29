//! The row source abstraction the encoder pulls from.

use rivulet_common::{Result, error::Error};
use rivulet_format::{sql_type::ColumnDescriptor, value::Row};

/// A forward-only cursor over the result of a query.
///
/// The column descriptors are available before the first fetch and do not
/// change afterwards. Rows are fetched into a caller-owned buffer so the
/// encode loop can reuse one allocation for the whole result.
pub trait Cursor {
    /// Describes the result columns, in order.
    fn columns(&self) -> &[ColumnDescriptor];

    /// Fetches the next row into `row`, replacing its content.
    ///
    /// Returns `false` once the cursor is exhausted; `row` is then left in
    /// an unspecified state.
    fn next_row(&mut self, row: &mut Row) -> Result<bool>;

    /// Releases the cursor. Called exactly once by
    /// [`stream_cursor`](crate::stream::stream_cursor), on success and
    /// failure alike.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<C: Cursor + ?Sized> Cursor for &mut C {
    fn columns(&self) -> &[ColumnDescriptor] {
        (**self).columns()
    }

    fn next_row(&mut self, row: &mut Row) -> Result<bool> {
        (**self).next_row(row)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<C: Cursor + ?Sized> Cursor for Box<C> {
    fn columns(&self) -> &[ColumnDescriptor] {
        (**self).columns()
    }

    fn next_row(&mut self, row: &mut Row) -> Result<bool> {
        (**self).next_row(row)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// A cursor over rows held in memory.
#[derive(Debug, Clone)]
pub struct MemoryCursor {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<Row>,
    pos: usize,
    closed: bool,
}

impl MemoryCursor {
    pub fn new(columns: Vec<ColumnDescriptor>, rows: Vec<Row>) -> MemoryCursor {
        MemoryCursor {
            columns,
            rows,
            pos: 0,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of rows fetched so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Cursor for MemoryCursor {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    fn next_row(&mut self, row: &mut Row) -> Result<bool> {
        if self.closed {
            return Err(Error::cursor(
                "fetch",
                std::io::Error::other("cursor is closed"),
            ));
        }
        match self.rows.get(self.pos) {
            Some(next) => {
                row.assign_from(next);
                self.pos += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
