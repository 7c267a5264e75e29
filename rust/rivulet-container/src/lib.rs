//! Streaming conversion of a relational query cursor into a self-describing
//! row container, and the reader that decodes such a container.
//!
//! The writer never holds more than one encoded block plus one row in memory,
//! whatever the number of rows the cursor produces.

pub mod cursor;
pub mod read;
pub mod stream;
pub mod write;

pub use cursor::{Cursor, MemoryCursor};
pub use read::container_reader::ContainerReader;
pub use stream::{StreamParams, StreamReport, stream_cursor, stream_cursor_with_report};
pub use write::container_writer::{ContainerWriter, WriterParams, WriterState};
