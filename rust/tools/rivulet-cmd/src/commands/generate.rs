//! Generate command implementation

use std::sync::Arc;

use anyhow::{Context, Result};
use rivulet_container::{StreamParams, WriterParams, stream_cursor_with_report};
use rivulet_io::FileWriter;
use rivulet_testkit::{CrossJoinCursor, Projection, TestTables, sqlite};

use crate::utils;

/// Run the generate command
pub fn run(
    seed: u64,
    size: usize,
    all_columns: bool,
    sqlite_path: Option<String>,
    output: String,
) -> Result<()> {
    let tables = Arc::new(TestTables::generate(seed, size, size, size));
    println!(
        "Generated {size} persons, products and relationships (seed {seed}), {} joined rows",
        tables.cross_join_len()
    );

    if let Some(db_path) = sqlite_path {
        let mut conn = rusqlite::Connection::open(&db_path)
            .with_context(|| format!("Failed to create database {db_path}"))?;
        sqlite::load_tables(&mut conn, &tables)?;
        println!("Stored the tables in: {db_path}");
    }

    let projection = if all_columns {
        Projection::All
    } else {
        Projection::PersonsOnly
    };
    let params = StreamParams {
        writer: WriterParams::default()
            .with_property("generator.seed", seed.to_string())
            .with_property("generator.size", size.to_string()),
        ..Default::default()
    };
    let sink = FileWriter::create_or_truncate(&output)
        .with_context(|| format!("Failed to create {output}"))?;
    let cursor = CrossJoinCursor::new(tables, projection);
    let report = stream_cursor_with_report(cursor, Box::new(sink), &params)
        .context("Failed to write the container")?;

    println!(
        "Wrote {} rows in {} blocks ({}) to: {output}",
        report.row_count,
        report.block_count,
        utils::format_size(report.bytes_written)
    );
    Ok(())
}
