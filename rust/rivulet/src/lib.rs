//! # Rivulet: streaming query results into self-describing containers
//!
//! Rivulet drains a forward-only relational cursor into a binary container
//! that embeds its own record schema. Rows are encoded one at a time into
//! bounded blocks, so a result of any size is converted with memory
//! proportional to one block.
//!
//! ## Module Organization
//!
//! * [`common`] - The shared error type and result alias
//! * [`io`] - The `SealingWrite` sink abstraction with file and memory sinks
//! * [`format`] - Container constants and messages, logical types, column
//!   descriptors, type mapping and schema building
//! * [`container`] - The row encoder, the container writer and reader, the
//!   `Cursor` trait and the `stream_cursor` driver
//! * [`sqlite`] - Cursors and a query executor over SQLite connections
//!
//! ## Example
//!
//! ```no_run
//! use rivulet::{container::ContainerReader, io::FileWriter, sqlite::QueryExecutor};
//!
//! # fn main() -> rivulet::common::Result<()> {
//! let conn = rusqlite::Connection::open("data.sqlite").expect("open");
//! let sink = FileWriter::create("persons.rvlt")?;
//! let report = QueryExecutor::new(&conn).execute(
//!     "select id, name, code from persons",
//!     Box::new(sink),
//!     &Default::default(),
//! )?;
//!
//! let file = std::fs::File::open("persons.rvlt")?;
//! let reader = ContainerReader::open(std::io::BufReader::new(file))?;
//! assert_eq!(reader.count() as u64, report.row_count);
//! # Ok(())
//! # }
//! ```

pub use rivulet_common as common;
pub use rivulet_container as container;
pub use rivulet_format as format;
pub use rivulet_io as io;
pub use rivulet_sqlite as sqlite;

pub use rivulet_common::{Result, error::Error};
pub use rivulet_container::{
    ContainerReader, ContainerWriter, Cursor, MemoryCursor, StreamParams, WriterParams,
    stream_cursor,
};
pub use rivulet_format::{ColumnDescriptor, RecordSchema, Row, SqlType, Value};
