//! Conversion of SQLite's dynamically typed values to the logical type of
//! their column.
//!
//! A value that cannot be represented in the column's logical type is passed
//! through with its native type, so the row encoder rejects it with an
//! encode error naming the field.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rusqlite::types::ValueRef;

use rivulet_format::{schema::LogicalType, value::Value};

/// Julian day number of the Unix epoch.
const UNIX_EPOCH_JULIAN_DAY: f64 = 2_440_587.5;
const MILLIS_PER_DAY: f64 = 86_400_000.0;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Converts one SQLite value for a column of logical type `ty`.
pub fn convert_value(value: ValueRef<'_>, ty: LogicalType) -> Value {
    match (ty, value) {
        (_, ValueRef::Null) => Value::Null,
        (LogicalType::Utf8, value) => Value::Utf8(render_text(value)),

        (LogicalType::Boolean, ValueRef::Integer(v)) => Value::Boolean(v != 0),
        (LogicalType::Int32, ValueRef::Integer(v)) => {
            i32::try_from(v).map_or(Value::Int64(v), Value::Int32)
        }
        (LogicalType::Int64, ValueRef::Integer(v)) => Value::Int64(v),
        (LogicalType::Float32, ValueRef::Real(v)) => {
            let narrow = v as f32;
            if f64::from(narrow) == v || v.is_nan() {
                Value::Float32(narrow)
            } else {
                Value::Float64(v)
            }
        }
        (LogicalType::Float32, ValueRef::Integer(v)) => {
            let narrow = v as f32;
            if exact_integer(f64::from(narrow), v) {
                Value::Float32(narrow)
            } else {
                Value::Int64(v)
            }
        }
        (LogicalType::Float64, ValueRef::Real(v)) => Value::Float64(v),
        (LogicalType::Float64, ValueRef::Integer(v)) => {
            let wide = v as f64;
            if exact_integer(wide, v) {
                Value::Float64(wide)
            } else {
                Value::Int64(v)
            }
        }

        (LogicalType::DecimalText, ValueRef::Integer(v)) => Value::Decimal(v.to_string()),
        (LogicalType::DecimalText, ValueRef::Real(v)) => Value::Decimal(v.to_string()),
        (LogicalType::DecimalText, ValueRef::Text(text)) => {
            Value::Decimal(String::from_utf8_lossy(text).trim().to_string())
        }

        (LogicalType::Binary, ValueRef::Blob(bytes) | ValueRef::Text(bytes)) => {
            Value::Binary(bytes.to_vec())
        }

        // Unix seconds, as written by `unixepoch()` and `strftime('%s')`.
        (LogicalType::EpochMillis, ValueRef::Integer(v)) => v
            .checked_mul(1000)
            .map_or(Value::Int64(v), Value::EpochMillis),
        // Julian day number, as written by `julianday()`.
        (LogicalType::EpochMillis, ValueRef::Real(v)) if v.is_finite() => {
            Value::EpochMillis(((v - UNIX_EPOCH_JULIAN_DAY) * MILLIS_PER_DAY).round() as i64)
        }
        (LogicalType::EpochMillis, ValueRef::Text(text)) => {
            let text = String::from_utf8_lossy(text);
            parse_epoch_millis(&text).map_or_else(|| Value::Utf8(text.into_owned()), Value::EpochMillis)
        }

        (_, value) => native_value(value),
    }
}

/// `true` if `float` is exactly the integer `v`.
fn exact_integer(float: f64, v: i64) -> bool {
    // 2^63 is the first float past `i64::MAX`; `as` would saturate to it.
    float < 9_223_372_036_854_775_808.0 && float as i64 == v
}

/// The value with its storage class as logical type.
pub fn native_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int64(v),
        ValueRef::Real(v) => Value::Float64(v),
        ValueRef::Text(text) => Value::Utf8(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::Binary(bytes.to_vec()),
    }
}

/// Default text rendering; blobs are rendered as lower-case hex.
pub fn render_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(v) => v.to_string(),
        ValueRef::Real(v) => v.to_string(),
        ValueRef::Text(text) => String::from_utf8_lossy(text).into_owned(),
        ValueRef::Blob(bytes) => bytes.iter().map(|b| format!("{b:02x}")).collect(),
    }
}

/// Parses SQLite's textual date and time forms into milliseconds since the
/// Unix epoch. Values without an offset are taken as UTC; a bare time of day
/// gives the milliseconds since midnight.
pub fn parse_epoch_millis(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis());
    }
    if let Ok(time) = NaiveTime::parse_from_str(text, "%H:%M:%S%.f") {
        return Some(
            i64::from(time.num_seconds_from_midnight()) * 1000
                + i64::from(time.nanosecond() / 1_000_000),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_narrowing() {
        assert_eq!(
            convert_value(ValueRef::Integer(42), LogicalType::Int32),
            Value::Int32(42)
        );
        assert_eq!(
            convert_value(ValueRef::Integer(1 << 40), LogicalType::Int32),
            Value::Int64(1 << 40)
        );
        assert_eq!(
            convert_value(ValueRef::Integer(1), LogicalType::Boolean),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_text_columns_render_anything() {
        assert_eq!(
            convert_value(ValueRef::Integer(7), LogicalType::Utf8),
            Value::Utf8("7".into())
        );
        assert_eq!(
            convert_value(ValueRef::Real(2.5), LogicalType::Utf8),
            Value::Utf8("2.5".into())
        );
        assert_eq!(
            convert_value(ValueRef::Blob(&[0xca, 0xfe]), LogicalType::Utf8),
            Value::Utf8("cafe".into())
        );
        assert_eq!(convert_value(ValueRef::Null, LogicalType::Utf8), Value::Null);
    }

    #[test]
    fn test_decimals() {
        assert_eq!(
            convert_value(ValueRef::Real(12.5), LogicalType::DecimalText),
            Value::Decimal("12.5".into())
        );
        assert_eq!(
            convert_value(ValueRef::Text(b" 0.10 "), LogicalType::DecimalText),
            Value::Decimal("0.10".into())
        );
    }

    #[test]
    fn test_dates() {
        assert_eq!(parse_epoch_millis("1970-01-02"), Some(86_400_000));
        assert_eq!(parse_epoch_millis("2010-01-01 00:00:00.250"), Some(1_262_304_000_250));
        assert_eq!(parse_epoch_millis("2010-01-01T00:00:00+01:00"), Some(1_262_300_400_000));
        assert_eq!(parse_epoch_millis("00:01:00.5"), Some(60_500));
        assert_eq!(parse_epoch_millis("yesterday"), None);

        assert_eq!(
            convert_value(ValueRef::Integer(60), LogicalType::EpochMillis),
            Value::EpochMillis(60_000)
        );
        assert_eq!(
            convert_value(ValueRef::Real(2_440_588.5), LogicalType::EpochMillis),
            Value::EpochMillis(86_400_000)
        );
        assert_eq!(
            convert_value(ValueRef::Text(b"soon"), LogicalType::EpochMillis),
            Value::Utf8("soon".into())
        );
    }

    #[test]
    fn test_unconvertible_values_pass_through() {
        assert_eq!(
            convert_value(ValueRef::Text(b"abc"), LogicalType::Int32),
            Value::Utf8("abc".into())
        );
        assert_eq!(
            convert_value(ValueRef::Real(1.5), LogicalType::Binary),
            Value::Float64(1.5)
        );
    }

    #[test]
    fn test_floats_are_not_rounded() {
        assert_eq!(
            convert_value(ValueRef::Real(0.1), LogicalType::Float64),
            Value::Float64(0.1)
        );
        assert_eq!(
            convert_value(ValueRef::Real(0.5), LogicalType::Float32),
            Value::Float32(0.5)
        );
        // Not representable in single precision: left for the encoder to reject.
        assert_eq!(
            convert_value(ValueRef::Real(0.1), LogicalType::Float32),
            Value::Float64(0.1)
        );
        assert_eq!(
            convert_value(ValueRef::Integer(16_777_217), LogicalType::Float32),
            Value::Int64(16_777_217)
        );
        assert_eq!(
            convert_value(ValueRef::Integer(-3), LogicalType::Float64),
            Value::Float64(-3.0)
        );
        assert_eq!(
            convert_value(ValueRef::Integer(i64::MAX), LogicalType::Float64),
            Value::Int64(i64::MAX)
        );
    }
}
