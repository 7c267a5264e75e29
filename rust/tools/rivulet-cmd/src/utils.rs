//! Common utilities for rivulet-cmd

use anyhow::Result;
use rivulet_format::Value;
use serde_json::json;
use std::path::Path;

/// Checks if a file exists and is readable
pub fn validate_file_exists(path: &str) -> Result<()> {
    let file_path = Path::new(path);
    if !file_path.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }
    if !file_path.is_file() {
        anyhow::bail!("Path is not a file: {}", path);
    }
    Ok(())
}

/// Formats file size in human-readable format
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Splits a `NAME=VALUE` header property argument.
pub fn parse_property(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => anyhow::bail!("Invalid property '{}', expected NAME=VALUE", arg),
    }
}

/// Renders a cell value as JSON.
///
/// Decimals stay strings to keep their precision, binary values become
/// lowercase hex and non-finite floats become their text form.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(v) => json!(v),
        Value::Int32(v) => json!(v),
        Value::Int64(v) | Value::EpochMillis(v) => json!(v),
        Value::Float32(v) => float_to_json(*v as f64),
        Value::Float64(v) => float_to_json(*v),
        Value::Decimal(v) | Value::Utf8(v) => json!(v),
        Value::Binary(bytes) => json!(to_hex(bytes)),
    }
}

fn float_to_json(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or_else(|| json!(v.to_string()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
