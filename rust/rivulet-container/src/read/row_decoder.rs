//! Row decoding, the inverse of [`crate::write::row_encoder`].

use rivulet_common::{Result, error::Error};
use rivulet_format::{
    defs::{PRESENCE_NULL, PRESENCE_VALUE, VALUE_LEN_SIZE},
    schema::{FieldSchema, LogicalType, RecordSchema},
    value::{Row, Value},
};

/// Decodes one row from the front of `buf`, advancing `buf` past it.
///
/// `row` is cleared and refilled with one value per schema field.
///
/// # Errors
///
/// `InvalidFormat` if the bytes run out, a presence or boolean byte is out of
/// range, text is not valid UTF-8, or a non-nullable field is null.
pub fn decode_row(schema: &RecordSchema, buf: &mut &[u8], row: &mut Row) -> Result<()> {
    row.clear();
    for field in schema.fields() {
        row.push(decode_value(field, buf)?);
    }
    Ok(())
}

fn decode_value(field: &FieldSchema, buf: &mut &[u8]) -> Result<Value> {
    match take_byte(field, buf)? {
        PRESENCE_NULL if field.nullable => return Ok(Value::Null),
        PRESENCE_NULL => {
            return Err(Error::invalid_format_msg(
                &field.name,
                "null in a non-nullable field",
            ));
        }
        PRESENCE_VALUE => (),
        other => {
            return Err(Error::invalid_format_msg(
                &field.name,
                format!("invalid presence byte {other}"),
            ));
        }
    }

    let value = match field.logical_type {
        LogicalType::Boolean => match take_byte(field, buf)? {
            0 => Value::Boolean(false),
            1 => Value::Boolean(true),
            other => {
                return Err(Error::invalid_format_msg(
                    &field.name,
                    format!("invalid boolean byte {other}"),
                ));
            }
        },
        LogicalType::Int32 => Value::Int32(i32::from_le_bytes(take_array(field, buf)?)),
        LogicalType::Int64 => Value::Int64(i64::from_le_bytes(take_array(field, buf)?)),
        LogicalType::EpochMillis => {
            Value::EpochMillis(i64::from_le_bytes(take_array(field, buf)?))
        }
        LogicalType::Float32 => {
            Value::Float32(f32::from_bits(u32::from_le_bytes(take_array(field, buf)?)))
        }
        LogicalType::Float64 => {
            Value::Float64(f64::from_bits(u64::from_le_bytes(take_array(field, buf)?)))
        }
        LogicalType::DecimalText => Value::Decimal(take_text(field, buf)?),
        LogicalType::Utf8 => Value::Utf8(take_text(field, buf)?),
        LogicalType::Binary => Value::Binary(take_var_len(field, buf)?.to_vec()),
    };
    Ok(value)
}

fn take_bytes<'a>(field: &FieldSchema, buf: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    if buf.len() < len {
        return Err(Error::invalid_format_msg(
            &field.name,
            "row data ends inside a value",
        ));
    }
    let (head, tail) = buf.split_at(len);
    *buf = tail;
    Ok(head)
}

fn take_byte(field: &FieldSchema, buf: &mut &[u8]) -> Result<u8> {
    Ok(take_bytes(field, buf, 1)?[0])
}

fn take_array<const N: usize>(field: &FieldSchema, buf: &mut &[u8]) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(take_bytes(field, buf, N)?);
    Ok(bytes)
}

fn take_var_len<'a>(field: &FieldSchema, buf: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = u32::from_le_bytes(take_array::<VALUE_LEN_SIZE>(field, buf)?) as usize;
    take_bytes(field, buf, len)
}

fn take_text(field: &FieldSchema, buf: &mut &[u8]) -> Result<String> {
    let bytes = take_var_len(field, buf)?;
    String::from_utf8(bytes.to_vec())
        .map_err(|_| Error::invalid_format_msg(&field.name, "text is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::row_encoder::encode_row;

    fn schema() -> RecordSchema {
        RecordSchema::new(
            "r",
            vec![
                FieldSchema::new("flag", LogicalType::Boolean, true),
                FieldSchema::new("id", LogicalType::Int64, false),
                FieldSchema::new("ratio", LogicalType::Float64, true),
                FieldSchema::new("amount", LogicalType::DecimalText, true),
                FieldSchema::new("name", LogicalType::Utf8, true),
                FieldSchema::new("blob", LogicalType::Binary, true),
                FieldSchema::new("at", LogicalType::EpochMillis, true),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_decode_sequence_of_rows() {
        let schema = schema();
        let rows: Vec<Row> = vec![
            vec![
                Value::Boolean(true),
                Value::Int64(i64::MIN),
                Value::Float64(f64::NAN),
                Value::Decimal("3.14".into()),
                Value::Utf8("żółw".into()),
                Value::Binary(vec![0, 1, 2]),
                Value::EpochMillis(-1),
            ]
            .into(),
            vec![
                Value::Null,
                Value::Int64(42),
                Value::Null,
                Value::Null,
                Value::Utf8(String::new()),
                Value::Null,
                Value::Null,
            ]
            .into(),
        ];
        let mut buf = Vec::new();
        for row in &rows {
            encode_row(&schema, row, &mut buf).unwrap();
        }

        let mut input = buf.as_slice();
        let mut row = Row::new();
        decode_row(&schema, &mut input, &mut row).unwrap();
        assert_eq!(row.get(1), Some(&Value::Int64(i64::MIN)));
        assert!(matches!(row.get(2), Some(Value::Float64(v)) if v.is_nan()));
        assert_eq!(row.get(4), Some(&Value::Utf8("żółw".into())));
        decode_row(&schema, &mut input, &mut row).unwrap();
        assert_eq!(row, rows[1]);
        assert!(input.is_empty());
    }

    #[test]
    fn test_truncated_row() {
        let schema = schema();
        let row: Row = vec![
            Value::Null,
            Value::Int64(7),
            Value::Null,
            Value::Null,
            Value::Utf8("abc".into()),
            Value::Null,
            Value::Null,
        ]
        .into();
        let mut buf = Vec::new();
        encode_row(&schema, &row, &mut buf).unwrap();
        for len in 0..buf.len() {
            let mut input = &buf[..len];
            let mut decoded = Row::new();
            assert!(decode_row(&schema, &mut input, &mut decoded).is_err(), "{len}");
        }
    }

    #[test]
    fn test_invalid_bytes() {
        let schema = RecordSchema::new(
            "r",
            vec![FieldSchema::new("flag", LogicalType::Boolean, false)],
        )
        .unwrap();
        let mut row = Row::new();
        let cases: [&[u8]; 3] = [&[2, 1], &[1, 5], &[0]];
        for bad in cases {
            let mut input = bad;
            assert!(decode_row(&schema, &mut input, &mut row).is_err());
        }
    }
}
