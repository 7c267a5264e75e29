//! Maps driver-reported column types onto the closed set of logical types.
//!
//! The mapping is total: every column yields a field. Codes without a
//! dedicated logical type (vendor codes, arrays, structs, `OTHER`, ...) fall
//! back to `Utf8`, carrying the driver's default text rendering of the value.

use crate::{
    defs::LogicalType,
    schema::FieldSchema,
    sql_type::{ColumnDescriptor, SqlType},
};

/// Largest `FLOAT(p)` precision, in binary digits, stored as single precision.
const FLOAT32_MAX_BINARY_PRECISION: u32 = 24;

/// Maps one column descriptor to its field schema. The output name is the
/// column label as is; normalization is up to the schema builder.
pub fn map_column(column: &ColumnDescriptor) -> FieldSchema {
    FieldSchema {
        name: column.name.clone(),
        source_name: column.name.clone(),
        logical_type: logical_type_for(column.sql_type, column.precision),
        nullable: column.nullable,
        source_type: column.sql_type,
        source_type_name: column.type_name.clone(),
        precision: column.precision,
        scale: column.scale,
    }
}

/// Resolves the logical type for a SQL type code and its reported precision.
pub fn logical_type_for(sql_type: SqlType, precision: u32) -> LogicalType {
    if let Some(width) = sql_type.integer_bit_width() {
        return if width <= 32 {
            LogicalType::Int32
        } else {
            LogicalType::Int64
        };
    }
    match sql_type {
        SqlType::RowId => LogicalType::Int64,
        SqlType::Real => LogicalType::Float32,
        SqlType::Float if (1..=FLOAT32_MAX_BINARY_PRECISION).contains(&precision) => {
            LogicalType::Float32
        }
        SqlType::Float | SqlType::Double => LogicalType::Float64,
        SqlType::Decimal | SqlType::Numeric => LogicalType::DecimalText,
        SqlType::Char
        | SqlType::VarChar
        | SqlType::LongVarChar
        | SqlType::NChar
        | SqlType::NVarChar
        | SqlType::LongNVarChar
        | SqlType::Clob
        | SqlType::NClob
        | SqlType::SqlXml => LogicalType::Utf8,
        SqlType::Binary | SqlType::VarBinary | SqlType::LongVarBinary | SqlType::Blob => {
            LogicalType::Binary
        }
        SqlType::Bit if precision > 1 => LogicalType::Binary,
        SqlType::Bit | SqlType::Boolean => LogicalType::Boolean,
        SqlType::Date
        | SqlType::Time
        | SqlType::Timestamp
        | SqlType::TimeWithTimezone
        | SqlType::TimestampWithTimezone => LogicalType::EpochMillis,
        _ => LogicalType::Utf8,
    }
}
