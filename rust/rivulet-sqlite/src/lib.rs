//! SQLite-backed query cursors.
//!
//! [`SqliteCursor`] adapts a prepared `rusqlite` statement to the
//! [`Cursor`](rivulet_container::Cursor) trait, deriving column descriptors
//! from the declared column types. [`QueryExecutor`] runs a query with an
//! optional time limit and streams its result into a container.

pub mod columns;
pub mod convert;
pub mod cursor;
pub mod executor;

pub use columns::{describe_columns, parse_decl_type, sqlite_sql_type};
pub use cursor::SqliteCursor;
pub use executor::{QueryExecutor, QueryOptions, QueryReport};
