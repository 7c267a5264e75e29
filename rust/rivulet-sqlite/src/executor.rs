//! Query execution into a container, with an optional time limit.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use rusqlite::Connection;

use rivulet_common::{Result, error::Error};
use rivulet_container::{StreamParams, WriterParams, stream_cursor_with_report};
use rivulet_format::{NameCollisionPolicy, SchemaBuilderParams};
use rivulet_io::SealingWrite;

use crate::cursor::SqliteCursor;

/// Number of virtual machine instructions between deadline checks.
const PROGRESS_CHECK_INTERVAL: i32 = 1000;

/// Name of the header property holding the query text.
pub const QUERY_PROPERTY: &str = "query";

/// Options of [`QueryExecutor::execute`].
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Longest time the query may run, including the time spent streaming
    /// its rows. Zero means no limit.
    pub timeout: Duration,
    pub record_name: String,
    /// Extra header properties, written after the query text.
    pub properties: Vec<(String, String)>,
    pub collision_policy: NameCollisionPolicy,
    pub block_size: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            timeout: Duration::ZERO,
            record_name: SchemaBuilderParams::default().record_name,
            properties: Vec::new(),
            collision_policy: NameCollisionPolicy::default(),
            block_size: WriterParams::DEFAULT_BLOCK_SIZE,
        }
    }
}

/// Outcome of a successful query export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryReport {
    pub row_count: u64,
    pub bytes_written: u64,
    pub elapsed: Duration,
}

/// Runs queries on a connection and streams their results into containers.
pub struct QueryExecutor<'conn> {
    conn: &'conn Connection,
}

impl<'conn> QueryExecutor<'conn> {
    pub fn new(conn: &'conn Connection) -> QueryExecutor<'conn> {
        QueryExecutor { conn }
    }

    /// Executes `sql` and writes its whole result to `sink`.
    ///
    /// The query text is stored in the container header under
    /// [`QUERY_PROPERTY`].
    ///
    /// # Errors
    ///
    /// Cursor errors (`is_io()`) if the query cannot be prepared, fails
    /// while running or exceeds the timeout; otherwise the errors of
    /// [`stream_cursor`](rivulet_container::stream_cursor).
    pub fn execute(
        &self,
        sql: &str,
        sink: Box<dyn SealingWrite>,
        options: &QueryOptions,
    ) -> Result<QueryReport> {
        let start = Instant::now();
        let deadline = DeadlineGuard::install(self.conn, start, options.timeout);

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| deadline.map_error("prepare", e))?;
        let cursor = SqliteCursor::new(&mut stmt).map_err(|e| deadline.check(e))?;

        let mut properties = Vec::with_capacity(options.properties.len() + 1);
        properties.push((QUERY_PROPERTY.to_string(), sql.to_string()));
        properties.extend(options.properties.iter().cloned());
        let params = StreamParams {
            schema: SchemaBuilderParams {
                record_name: options.record_name.clone(),
                collision_policy: options.collision_policy,
            },
            writer: WriterParams {
                block_size: options.block_size,
                sync_marker: None,
                properties,
            },
        };
        let report = stream_cursor_with_report(cursor, sink, &params).map_err(|e| deadline.check(e))?;

        let elapsed = start.elapsed();
        log::info!(
            "query returned {} rows in {elapsed:?} ({} bytes)",
            report.row_count,
            report.bytes_written
        );
        Ok(QueryReport {
            row_count: report.row_count,
            bytes_written: report.bytes_written,
            elapsed,
        })
    }
}

/// Interrupts statements on the connection once the deadline has passed.
/// The progress handler is removed when the guard is dropped.
struct DeadlineGuard<'conn> {
    conn: &'conn Connection,
    timeout: Duration,
    expired: Arc<AtomicBool>,
    installed: bool,
}

impl<'conn> DeadlineGuard<'conn> {
    fn install(conn: &'conn Connection, start: Instant, timeout: Duration) -> DeadlineGuard<'conn> {
        let expired = Arc::new(AtomicBool::new(false));
        // A deadline past what `Instant` can represent is no limit either.
        let deadline = start
            .checked_add(timeout)
            .filter(|_| !timeout.is_zero());
        let installed = deadline.is_some();
        if let Some(deadline) = deadline {
            let flag = expired.clone();
            conn.progress_handler(
                PROGRESS_CHECK_INTERVAL,
                Some(move || {
                    let interrupt = Instant::now() >= deadline;
                    if interrupt {
                        flag.store(true, Ordering::Relaxed);
                    }
                    interrupt
                }),
            );
        }
        DeadlineGuard {
            conn,
            timeout,
            expired,
            installed,
        }
    }

    fn map_error(&self, context: &str, error: rusqlite::Error) -> Error {
        self.check(Error::cursor(context, error))
    }

    /// Replaces an error caused by the interrupt with a timeout error.
    fn check(&self, error: Error) -> Error {
        if self.expired.load(Ordering::Relaxed) && error.is_io() {
            log::warn!("query interrupted after exceeding {:?}", self.timeout);
            Error::cursor(
                "query timeout",
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("query exceeded the timeout of {:?}", self.timeout),
                ),
            )
        } else {
            error
        }
    }
}

impl Drop for DeadlineGuard<'_> {
    fn drop(&mut self) {
        if self.installed {
            self.conn
                .progress_handler(0, None::<fn() -> bool>);
        }
    }
}

#[cfg(test)]
mod tests {
    use rivulet_io::SharedBuffer;

    use super::*;

    #[test]
    fn test_prepare_error_is_cursor_error() {
        let conn = Connection::open_in_memory().unwrap();
        let buffer = SharedBuffer::new();
        let err = QueryExecutor::new(&conn)
            .execute("select * from missing", Box::new(buffer.clone()), &Default::default())
            .unwrap_err();
        assert!(err.is_io());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_timeout_interrupts_query() {
        let conn = Connection::open_in_memory().unwrap();
        let sql = "with recursive n(x) as (select 1 union all select x + 1 from n) \
                   select count(*) from n";
        let options = QueryOptions {
            timeout: Duration::from_millis(50),
            ..Default::default()
        };
        let buffer = SharedBuffer::new();
        let err = QueryExecutor::new(&conn)
            .execute(sql, Box::new(buffer.clone()), &options)
            .unwrap_err();
        assert!(err.is_io());
        assert!(err.to_string().contains("timeout"), "{err}");
        assert!(!buffer.is_sealed());

        // The handler is gone: later queries on the connection are not cut short.
        let value: i64 = conn.query_row("select 41 + 1", [], |r| r.get(0)).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_unrepresentable_timeout_means_no_limit() {
        let conn = Connection::open_in_memory().unwrap();
        let options = QueryOptions {
            timeout: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        let buffer = SharedBuffer::new();
        let report = QueryExecutor::new(&conn)
            .execute("select 1 as one union all select 2", Box::new(buffer.clone()), &options)
            .unwrap();
        assert_eq!(report.row_count, 2);
        assert!(buffer.is_sealed());
    }
}
