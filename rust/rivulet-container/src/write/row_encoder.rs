//! Row encoding.
//!
//! Every field of a row starts with a presence byte (`0` null, `1` value),
//! followed for present values by the payload:
//!
//! | logical type          | payload                          |
//! |-----------------------|----------------------------------|
//! | boolean               | 1 byte, `0` or `1`               |
//! | int32                 | 4 bytes LE                       |
//! | int64, epoch-millis   | 8 bytes LE                       |
//! | float32, float64      | IEEE 754 bits, LE                |
//! | decimal, utf8, binary | `u32` LE byte length, then bytes |

use rivulet_common::{Result, error::Error};
use rivulet_format::{
    defs::{PRESENCE_NULL, PRESENCE_VALUE},
    schema::{FieldSchema, LogicalType, RecordSchema},
    value::{Row, Value, is_decimal_text, logical_type_label},
};

/// Appends the encoding of `row` to `buf`.
///
/// On error `buf` is restored to its length before the call, so a block
/// never contains a partial row.
///
/// # Errors
///
/// Returns an encode error if the row arity differs from the schema, a value
/// does not match its field's logical type, a non-nullable field holds null,
/// a decimal is not valid decimal text, or a variable-length value does not
/// fit a `u32` length.
pub fn encode_row(schema: &RecordSchema, row: &Row, buf: &mut Vec<u8>) -> Result<()> {
    let start = buf.len();
    let result = encode_fields(schema, row, buf);
    if result.is_err() {
        buf.truncate(start);
    }
    result
}

fn encode_fields(schema: &RecordSchema, row: &Row, buf: &mut Vec<u8>) -> Result<()> {
    if row.len() != schema.len() {
        return Err(Error::encode(
            schema.name(),
            format!(
                "row has {} values, the schema has {} fields",
                row.len(),
                schema.len()
            ),
        ));
    }
    for (field, value) in schema.fields().iter().zip(row.values()) {
        encode_value(field, value, buf)?;
    }
    Ok(())
}

fn encode_value(field: &FieldSchema, value: &Value, buf: &mut Vec<u8>) -> Result<()> {
    if value.is_null() {
        if !field.nullable {
            return Err(Error::encode(&field.name, "null in a non-nullable field"));
        }
        buf.push(PRESENCE_NULL);
        return Ok(());
    }

    match (field.logical_type, value) {
        (LogicalType::Boolean, Value::Boolean(v)) => {
            buf.push(PRESENCE_VALUE);
            buf.push(*v as u8);
        }
        (LogicalType::Int32, Value::Int32(v)) => {
            buf.push(PRESENCE_VALUE);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        (LogicalType::Int64, Value::Int64(v)) | (LogicalType::EpochMillis, Value::EpochMillis(v)) => {
            buf.push(PRESENCE_VALUE);
            buf.extend_from_slice(&v.to_le_bytes());
        }
        (LogicalType::Float32, Value::Float32(v)) => {
            buf.push(PRESENCE_VALUE);
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        (LogicalType::Float64, Value::Float64(v)) => {
            buf.push(PRESENCE_VALUE);
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        (LogicalType::DecimalText, Value::Decimal(text)) => {
            if !is_decimal_text(text) {
                return Err(Error::encode(
                    &field.name,
                    format!("'{text}' is not a decimal number"),
                ));
            }
            encode_var_len(field, text.as_bytes(), buf)?;
        }
        (LogicalType::Utf8, Value::Utf8(text)) => encode_var_len(field, text.as_bytes(), buf)?,
        (LogicalType::Binary, Value::Binary(bytes)) => encode_var_len(field, bytes, buf)?,
        (expected, actual) => {
            return Err(Error::encode(
                &field.name,
                format!(
                    "expected {}, got {}",
                    logical_type_label(expected),
                    actual.type_label()
                ),
            ));
        }
    }
    Ok(())
}

fn encode_var_len(field: &FieldSchema, bytes: &[u8], buf: &mut Vec<u8>) -> Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        Error::encode(
            &field.name,
            format!("value of {} bytes exceeds the u32 length limit", bytes.len()),
        )
    })?;
    buf.push(PRESENCE_VALUE);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}
