//! Driver-reported column metadata: the SQL type codes and the per-column
//! descriptor a cursor exposes once, before its first row.

use std::fmt;

/// SQL type code of a result column, numbered as the JDBC `java.sql.Types`
/// constants. Vendor-specific codes are preserved in [`SqlType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Char,
    VarChar,
    LongVarChar,
    Date,
    Time,
    Timestamp,
    Binary,
    VarBinary,
    LongVarBinary,
    Null,
    JavaObject,
    Distinct,
    Struct,
    Array,
    Blob,
    Clob,
    Ref,
    DataLink,
    Boolean,
    RowId,
    NChar,
    NVarChar,
    LongNVarChar,
    NClob,
    SqlXml,
    RefCursor,
    TimeWithTimezone,
    TimestampWithTimezone,
    /// Any code not listed above, including the generic `OTHER` (1111).
    Other(i32),
}

impl SqlType {
    /// The generic `OTHER` code.
    pub const OTHER_CODE: i32 = 1111;

    /// Decodes a numeric type code. Total: unknown codes become `Other`.
    pub fn from_code(code: i32) -> SqlType {
        match code {
            -7 => SqlType::Bit,
            -6 => SqlType::TinyInt,
            5 => SqlType::SmallInt,
            4 => SqlType::Integer,
            -5 => SqlType::BigInt,
            6 => SqlType::Float,
            7 => SqlType::Real,
            8 => SqlType::Double,
            2 => SqlType::Numeric,
            3 => SqlType::Decimal,
            1 => SqlType::Char,
            12 => SqlType::VarChar,
            -1 => SqlType::LongVarChar,
            91 => SqlType::Date,
            92 => SqlType::Time,
            93 => SqlType::Timestamp,
            -2 => SqlType::Binary,
            -3 => SqlType::VarBinary,
            -4 => SqlType::LongVarBinary,
            0 => SqlType::Null,
            2000 => SqlType::JavaObject,
            2001 => SqlType::Distinct,
            2002 => SqlType::Struct,
            2003 => SqlType::Array,
            2004 => SqlType::Blob,
            2005 => SqlType::Clob,
            2006 => SqlType::Ref,
            70 => SqlType::DataLink,
            16 => SqlType::Boolean,
            -8 => SqlType::RowId,
            -15 => SqlType::NChar,
            -9 => SqlType::NVarChar,
            -16 => SqlType::LongNVarChar,
            2011 => SqlType::NClob,
            2009 => SqlType::SqlXml,
            2012 => SqlType::RefCursor,
            2013 => SqlType::TimeWithTimezone,
            2014 => SqlType::TimestampWithTimezone,
            other => SqlType::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            SqlType::Bit => -7,
            SqlType::TinyInt => -6,
            SqlType::SmallInt => 5,
            SqlType::Integer => 4,
            SqlType::BigInt => -5,
            SqlType::Float => 6,
            SqlType::Real => 7,
            SqlType::Double => 8,
            SqlType::Numeric => 2,
            SqlType::Decimal => 3,
            SqlType::Char => 1,
            SqlType::VarChar => 12,
            SqlType::LongVarChar => -1,
            SqlType::Date => 91,
            SqlType::Time => 92,
            SqlType::Timestamp => 93,
            SqlType::Binary => -2,
            SqlType::VarBinary => -3,
            SqlType::LongVarBinary => -4,
            SqlType::Null => 0,
            SqlType::JavaObject => 2000,
            SqlType::Distinct => 2001,
            SqlType::Struct => 2002,
            SqlType::Array => 2003,
            SqlType::Blob => 2004,
            SqlType::Clob => 2005,
            SqlType::Ref => 2006,
            SqlType::DataLink => 70,
            SqlType::Boolean => 16,
            SqlType::RowId => -8,
            SqlType::NChar => -15,
            SqlType::NVarChar => -9,
            SqlType::LongNVarChar => -16,
            SqlType::NClob => 2011,
            SqlType::SqlXml => 2009,
            SqlType::RefCursor => 2012,
            SqlType::TimeWithTimezone => 2013,
            SqlType::TimestampWithTimezone => 2014,
            SqlType::Other(code) => *code,
        }
    }

    /// Resolves a declared SQL type name (without its parenthesized
    /// parameters), case-insensitively. Unrecognized names become
    /// `Other(1111)`.
    pub fn from_type_name(name: &str) -> SqlType {
        let name = name.trim().to_ascii_uppercase();
        match name.as_str() {
            "BIT" => SqlType::Bit,
            "TINYINT" | "INT1" => SqlType::TinyInt,
            "SMALLINT" | "INT2" => SqlType::SmallInt,
            "INT" | "INTEGER" | "INT4" | "MEDIUMINT" => SqlType::Integer,
            "BIGINT" | "INT8" | "UNSIGNED BIG INT" => SqlType::BigInt,
            "FLOAT" => SqlType::Float,
            "REAL" | "FLOAT4" => SqlType::Real,
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => SqlType::Double,
            "NUMERIC" => SqlType::Numeric,
            "DECIMAL" | "DEC" => SqlType::Decimal,
            "CHAR" | "CHARACTER" => SqlType::Char,
            "VARCHAR" | "CHARACTER VARYING" | "VARYING CHARACTER" | "TEXT" | "STRING" => {
                SqlType::VarChar
            }
            "LONG VARCHAR" => SqlType::LongVarChar,
            "NCHAR" | "NATIVE CHARACTER" => SqlType::NChar,
            "NVARCHAR" => SqlType::NVarChar,
            "LONG NVARCHAR" => SqlType::LongNVarChar,
            "CLOB" => SqlType::Clob,
            "NCLOB" => SqlType::NClob,
            "XML" => SqlType::SqlXml,
            "DATE" => SqlType::Date,
            "TIME" => SqlType::Time,
            "TIMESTAMP" | "DATETIME" => SqlType::Timestamp,
            "TIME WITH TIME ZONE" | "TIMETZ" => SqlType::TimeWithTimezone,
            "TIMESTAMP WITH TIME ZONE" | "TIMESTAMPTZ" => SqlType::TimestampWithTimezone,
            "BINARY" => SqlType::Binary,
            "VARBINARY" => SqlType::VarBinary,
            "LONG VARBINARY" => SqlType::LongVarBinary,
            "BLOB" => SqlType::Blob,
            "BOOLEAN" | "BOOL" => SqlType::Boolean,
            "ROWID" => SqlType::RowId,
            _ => SqlType::Other(SqlType::OTHER_CODE),
        }
    }

    /// Bit width of the integer types, `None` for everything else (including
    /// integer-like codes whose width the driver does not define).
    pub fn integer_bit_width(&self) -> Option<u32> {
        match self {
            SqlType::TinyInt => Some(8),
            SqlType::SmallInt => Some(16),
            SqlType::Integer => Some(32),
            SqlType::BigInt => Some(64),
            _ => None,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Other(code) => write!(f, "OTHER({code})"),
            other => write!(f, "{}", format!("{other:?}").to_ascii_uppercase()),
        }
    }
}

/// Metadata of one result column, as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column label (alias if one was given, otherwise the column name).
    pub name: String,
    pub sql_type: SqlType,
    /// Driver-specific type name, e.g. `VARCHAR` or `INTEGER`; may be empty.
    pub type_name: String,
    /// Precision: total digits for numeric types, maximum length for character
    /// and binary types, binary digits for `FLOAT(p)`. Zero when unknown.
    pub precision: u32,
    pub scale: i32,
    pub nullable: bool,
}

impl ColumnDescriptor {
    /// Creates a nullable descriptor with unknown precision and scale.
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> ColumnDescriptor {
        ColumnDescriptor {
            name: name.into(),
            sql_type,
            type_name: String::new(),
            precision: 0,
            scale: 0,
            nullable: true,
        }
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> ColumnDescriptor {
        self.type_name = type_name.into();
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: i32) -> ColumnDescriptor {
        self.precision = precision;
        self.scale = scale;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> ColumnDescriptor {
        self.nullable = nullable;
        self
    }

    pub fn not_null(self) -> ColumnDescriptor {
        self.with_nullable(false)
    }
}
