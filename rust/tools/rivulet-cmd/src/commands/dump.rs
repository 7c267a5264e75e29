//! Dump command implementation

use std::io::{BufWriter, Write};

use anyhow::{Context, Result};
use rivulet_format::Row;

use crate::{commands::open_container, utils};

/// Run the dump command
///
/// Prints one JSON object per row, keyed by field name.
pub fn run(limit: Option<u64>, path: String) -> Result<()> {
    let mut reader = open_container(&path)?;
    let names: Vec<String> = reader
        .schema()
        .fields()
        .iter()
        .map(|f| f.name.clone())
        .collect();

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut row = Row::with_capacity(names.len());
    while limit.is_none_or(|limit| reader.rows_read() < limit) {
        let has_row = reader
            .next_row(&mut row)
            .with_context(|| format!("Failed to read row {}", reader.rows_read() + 1))?;
        if !has_row {
            break;
        }
        let object: serde_json::Map<String, serde_json::Value> = names
            .iter()
            .zip(row.values())
            .map(|(name, value)| (name.clone(), utils::value_to_json(value)))
            .collect();
        serde_json::to_writer(&mut out, &object)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
