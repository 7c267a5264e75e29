//! Typed cell values and the reusable row buffer cursors fill in place.

use crate::defs::LogicalType;

/// A single cell value, either explicit null or tagged with its logical type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    /// Decimal in its ASCII text rendering, e.g. `-1234.50`.
    Decimal(String),
    Utf8(String),
    Binary(Vec<u8>),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
}

impl Value {
    /// The logical type this value carries, `None` for `Null`.
    pub fn logical_type(&self) -> Option<LogicalType> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => LogicalType::Boolean,
            Value::Int32(_) => LogicalType::Int32,
            Value::Int64(_) => LogicalType::Int64,
            Value::Float32(_) => LogicalType::Float32,
            Value::Float64(_) => LogicalType::Float64,
            Value::Decimal(_) => LogicalType::DecimalText,
            Value::Utf8(_) => LogicalType::Utf8,
            Value::Binary(_) => LogicalType::Binary,
            Value::EpochMillis(_) => LogicalType::EpochMillis,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short label used in diagnostics.
    pub fn type_label(&self) -> &'static str {
        self.logical_type().map_or("null", logical_type_label)
    }
}

pub fn logical_type_label(ty: LogicalType) -> &'static str {
    match ty {
        LogicalType::Boolean => "boolean",
        LogicalType::Int32 => "int32",
        LogicalType::Int64 => "int64",
        LogicalType::Float32 => "float32",
        LogicalType::Float64 => "float64",
        LogicalType::DecimalText => "decimal",
        LogicalType::Utf8 => "utf8",
        LogicalType::Binary => "binary",
        LogicalType::EpochMillis => "epoch-millis",
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Value {
        Value::Float32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Utf8(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Value {
        Value::Binary(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Value {
        v.map_or(Value::Null, Into::into)
    }
}

/// Checks that `text` is a plain ASCII decimal number:
/// `[+-]digits[.digits][(e|E)[+-]digits]`, where either the integral or the
/// fractional digits may be omitted but not both.
pub fn is_decimal_text(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut pos = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        pos += 1;
    }
    let int_digits = count_digits(&bytes[pos..]);
    pos += int_digits;
    let mut frac_digits = 0;
    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        frac_digits = count_digits(&bytes[pos..]);
        pos += frac_digits;
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        pos += 1;
        if matches!(bytes.get(pos), Some(b'+' | b'-')) {
            pos += 1;
        }
        let exp_digits = count_digits(&bytes[pos..]);
        if exp_digits == 0 {
            return false;
        }
        pos += exp_digits;
    }
    pos == bytes.len()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// An ordered sequence of values aligned with the record schema fields.
///
/// Rows are reused across fetches: [`Row::clear`] keeps the allocated
/// capacity so the encode loop does not allocate a fresh buffer per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new() -> Row {
        Default::default()
    }

    pub fn with_capacity(capacity: usize) -> Row {
        Row {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Replaces the content of this row with a copy of `other`, reusing the
    /// existing allocations where possible.
    pub fn assign_from(&mut self, other: &Row) {
        self.values.clone_from(&other.values);
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Row {
        Row { values }
    }
}

impl FromIterator<Value> for Row {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Row {
        Row {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_text() {
        for ok in ["0", "-1", "+12.50", ".5", "5.", "1E+3", "-2.5e-10", "123456789012345678901234567890"] {
            assert!(is_decimal_text(ok), "{ok}");
        }
        for bad in ["", "-", ".", "1.2.3", "1e", "abc", "12a", " 1", "1,5", "NaN", "１"] {
            assert!(!is_decimal_text(bad), "{bad}");
        }
    }

    #[test]
    fn test_value_types() {
        assert_eq!(Value::from(5).logical_type(), Some(LogicalType::Int32));
        assert_eq!(Value::from(5i64).type_label(), "int64");
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::Null.type_label(), "null");
        assert_eq!(
            Value::Decimal("1.5".into()).logical_type(),
            Some(LogicalType::DecimalText)
        );
    }

    #[test]
    fn test_row_reuse() {
        let mut row = Row::with_capacity(3);
        row.push(1);
        row.push("a");
        row.push(Value::Null);
        assert_eq!(row.len(), 3);
        let capacity = row.values.capacity();
        row.clear();
        assert!(row.is_empty());
        assert_eq!(row.values.capacity(), capacity);

        let other: Row = vec![Value::Int32(7), Value::Utf8("b".into())].into();
        row.assign_from(&other);
        assert_eq!(row, other);
    }
}
