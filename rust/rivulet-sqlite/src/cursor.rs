use rusqlite::{Rows, Statement};

use rivulet_common::{Result, error::Error};
use rivulet_container::Cursor;
use rivulet_format::{
    schema::LogicalType, sql_type::ColumnDescriptor, type_mapper::logical_type_for, value::Row,
};

use crate::{columns::describe_columns, convert::convert_value};

/// A [`Cursor`] over the rows of a prepared SQLite statement.
///
/// The statement is executed when the cursor is created; rows are stepped
/// one at a time as they are fetched.
pub struct SqliteCursor<'stmt> {
    columns: Vec<ColumnDescriptor>,
    types: Vec<LogicalType>,
    rows: Option<Rows<'stmt>>,
    fetched: u64,
}

impl<'stmt> SqliteCursor<'stmt> {
    /// Describes the columns of `stmt` and starts executing it.
    pub fn new(stmt: &'stmt mut Statement<'_>) -> Result<SqliteCursor<'stmt>> {
        let columns = describe_columns(stmt);
        let types = columns
            .iter()
            .map(|c| logical_type_for(c.sql_type, c.precision))
            .collect();
        let rows = stmt.query([]).map_err(|e| Error::cursor("execute", e))?;
        Ok(SqliteCursor {
            columns,
            types,
            rows: Some(rows),
            fetched: 0,
        })
    }

    /// Number of rows fetched so far.
    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    pub fn is_closed(&self) -> bool {
        self.rows.is_none()
    }
}

impl Cursor for SqliteCursor<'_> {
    fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    fn next_row(&mut self, row: &mut Row) -> Result<bool> {
        let Some(rows) = self.rows.as_mut() else {
            return Err(Error::cursor(
                "fetch",
                std::io::Error::other("cursor is closed"),
            ));
        };
        let Some(sql_row) = rows.next().map_err(|e| Error::cursor("fetch", e))? else {
            return Ok(false);
        };

        row.clear();
        for (index, ty) in self.types.iter().enumerate() {
            let value = sql_row
                .get_ref(index)
                .map_err(|e| Error::cursor("fetch", e))?;
            row.push(convert_value(value, *ty));
        }
        self.fetched += 1;
        Ok(true)
    }

    /// Resets the statement.
    fn close(&mut self) -> Result<()> {
        self.rows = None;
        Ok(())
    }
}
