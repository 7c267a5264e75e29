//! Export command implementation

use std::time::Duration;

use anyhow::{Context, Result};
use rivulet_format::NameCollisionPolicy;
use rivulet_io::FileWriter;
use rivulet_sqlite::{QueryExecutor, QueryOptions};
use rusqlite::{Connection, OpenFlags};

use crate::utils;

pub struct ExportArgs {
    pub db: String,
    pub query: Option<String>,
    pub query_file: Option<String>,
    pub timeout: u64,
    pub record_name: String,
    pub block_size: Option<usize>,
    pub rename_duplicates: bool,
    pub properties: Vec<String>,
    pub output: String,
}

/// Run the export command
pub fn run(args: ExportArgs) -> Result<()> {
    utils::validate_file_exists(&args.db)?;
    let sql = match (&args.query, &args.query_file) {
        (Some(query), _) => query.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read query file {path}"))?,
        (None, None) => anyhow::bail!("Either --query or --query-file is required"),
    };

    let mut options = QueryOptions {
        timeout: Duration::from_secs(args.timeout),
        record_name: args.record_name,
        properties: args
            .properties
            .iter()
            .map(|p| utils::parse_property(p))
            .collect::<Result<_>>()?,
        collision_policy: if args.rename_duplicates {
            NameCollisionPolicy::PositionalSuffix
        } else {
            NameCollisionPolicy::Reject
        },
        ..Default::default()
    };
    if let Some(block_size) = args.block_size {
        options.block_size = block_size;
    }

    let conn = Connection::open_with_flags(&args.db, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open database {}", args.db))?;
    let sink = FileWriter::create_or_truncate(&args.output)
        .with_context(|| format!("Failed to create {}", args.output))?;

    println!("Exporting query result into: {}", args.output);
    let report = QueryExecutor::new(&conn)
        .execute(&sql, Box::new(sink), &options)
        .context("Export failed")?;

    println!(
        "Wrote {} rows ({}) in {:.2?}",
        report.row_count,
        utils::format_size(report.bytes_written),
        report.elapsed
    );
    Ok(())
}
