//! Column descriptors from SQLite declared types.
//!
//! SQLite reports the type a column was declared with (for example
//! `varchar(100)` or `DECIMAL(12, 2)`), or nothing for expressions. The
//! declared name is resolved with [`SqlType::from_type_name`]; the optional
//! arguments become precision and scale.
//!
//! SQLite stores every integer in up to 8 bytes and every real as an 8-byte
//! double, whatever the declaration says. `INTEGER` and `INT` columns are
//! therefore reported as `BigInt` and all floating declarations as `Double`;
//! only explicitly narrow integers (`TINYINT`, `SMALLINT`) keep 32-bit
//! storage.

use rusqlite::Statement;

use rivulet_format::sql_type::{ColumnDescriptor, SqlType};

/// Describes the result columns of a prepared statement, in order.
///
/// SQLite does not report result nullability, so every column is nullable.
pub fn describe_columns(stmt: &Statement<'_>) -> Vec<ColumnDescriptor> {
    stmt.columns()
        .iter()
        .map(|column| describe_column(column.name(), column.decl_type()))
        .collect()
}

fn describe_column(name: &str, decl_type: Option<&str>) -> ColumnDescriptor {
    match decl_type {
        Some(decl) => {
            let (type_name, precision, scale) = parse_decl_type(decl);
            ColumnDescriptor::new(name, sqlite_sql_type(&type_name))
                .with_type_name(type_name)
                .with_precision(precision, scale)
        }
        None => ColumnDescriptor::new(name, SqlType::Other(SqlType::OTHER_CODE)),
    }
}

/// Resolves a declared type name to the type of the values SQLite actually
/// stores for it.
pub fn sqlite_sql_type(type_name: &str) -> SqlType {
    match SqlType::from_type_name(type_name) {
        SqlType::Integer => SqlType::BigInt,
        SqlType::Real | SqlType::Float => SqlType::Double,
        other => other,
    }
}

/// Splits a declared type into its upper-case name, precision and scale:
/// `"decimal(12, 2)"` gives `("DECIMAL", 12, 2)`. Missing or unparsable
/// arguments are reported as zero.
pub fn parse_decl_type(decl: &str) -> (String, u32, i32) {
    let decl = decl.trim();
    let (name, args) = match decl.split_once('(') {
        Some((name, rest)) => (name, rest.trim_end().trim_end_matches(')')),
        None => (decl, ""),
    };
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut args = args.split(',').map(|arg| arg.trim());
    let precision = args.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let scale = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);
    (name.to_ascii_uppercase(), precision, scale)
}
