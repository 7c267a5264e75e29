//! Container format constants and the protobuf messages embedded in the
//! container header and trailer.

pub const RIVULET_MAGIC: [u8; 4] = *b"rvlt";
pub const RIVULET_VERSION_MAJOR: u8 = 0;
pub const RIVULET_VERSION_MINOR: u16 = 1;
pub const RIVULET_VERSION_PATCH: u8 = 0;
pub const RIVULET_HEADER: [u8; 8] = [
    RIVULET_MAGIC[0],
    RIVULET_MAGIC[1],
    RIVULET_MAGIC[2],
    RIVULET_MAGIC[3],
    RIVULET_VERSION_PATCH,
    (RIVULET_VERSION_MINOR & 0xff) as u8,
    (RIVULET_VERSION_MINOR >> 8) as u8,
    RIVULET_VERSION_MAJOR,
];
pub const RIVULET_FOOTER: [u8; 8] = RIVULET_HEADER;

/// Container header size (magic and version).
pub const RIVULET_HEADER_SIZE: usize = RIVULET_HEADER.len();

/// Container footer size.
pub const RIVULET_FOOTER_SIZE: usize = RIVULET_FOOTER.len();

/// Size of the serialized protobuf message length prefix.
pub const MESSAGE_LEN_SIZE: usize = 4;

/// Size of the message and block checksum suffix.
pub const CHECKSUM_SIZE: usize = 4;

/// Size of the sync marker repeated after the header and after every block.
pub const SYNC_MARKER_SIZE: usize = 16;

/// Size of a block prefix: `row_count:u32` followed by `byte_len:u32`.
pub const BLOCK_PREFIX_SIZE: usize = 8;

/// Upper bound accepted for a header or trailer message when decoding.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Upper bound accepted for a single block when decoding.
pub const MAX_BLOCK_SIZE: usize = 1024 * 1024 * 1024;

/// Length prefix used for variable-size values (utf8, binary, decimal text).
pub const VALUE_LEN_SIZE: usize = 4;

/// Presence byte written in front of every field value.
pub const PRESENCE_NULL: u8 = 0;
pub const PRESENCE_VALUE: u8 = 1;

/// The closed set of value kinds a container can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum LogicalType {
    Boolean = 0,
    Int32 = 1,
    Int64 = 2,
    Float32 = 3,
    Float64 = 4,
    /// Fixed-precision decimal carried as its ASCII text rendering.
    DecimalText = 5,
    Utf8 = 6,
    Binary = 7,
    /// Milliseconds since 1970-01-01T00:00:00Z.
    EpochMillis = 8,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct FieldDef {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub source_name: String,
    #[prost(enumeration = "LogicalType", tag = "3")]
    pub logical_type: i32,
    #[prost(bool, tag = "4")]
    pub nullable: bool,
    #[prost(int32, tag = "5")]
    pub source_type_code: i32,
    #[prost(string, tag = "6")]
    pub source_type_name: String,
    #[prost(uint32, tag = "7")]
    pub precision: u32,
    #[prost(int32, tag = "8")]
    pub scale: i32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SchemaDef {
    #[prost(string, tag = "1")]
    pub record_name: String,
    #[prost(message, repeated, tag = "2")]
    pub fields: Vec<FieldDef>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct NameValuePair {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HeaderProperties {
    #[prost(message, repeated, tag = "1")]
    pub properties: Vec<NameValuePair>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ContainerTrailer {
    #[prost(uint64, tag = "1")]
    pub row_count: u64,
    #[prost(uint64, tag = "2")]
    pub block_count: u64,
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;

    #[test]
    fn test_header_layout() {
        assert_eq!(&RIVULET_HEADER[..4], b"rvlt");
        assert_eq!(RIVULET_HEADER[4], RIVULET_VERSION_PATCH);
        assert_eq!(
            u16::from_le_bytes([RIVULET_HEADER[5], RIVULET_HEADER[6]]),
            RIVULET_VERSION_MINOR
        );
        assert_eq!(RIVULET_HEADER[7], RIVULET_VERSION_MAJOR);
    }

    #[test]
    fn test_schema_def_serialization() {
        let def = SchemaDef {
            record_name: "query_result".into(),
            fields: vec![FieldDef {
                name: "id".into(),
                source_name: "ID".into(),
                logical_type: LogicalType::Int32.into(),
                nullable: false,
                source_type_code: 4,
                source_type_name: "INTEGER".into(),
                precision: 10,
                scale: 0,
            }],
        };
        let buf = def.encode_to_vec();
        let decoded = SchemaDef::decode(buf.as_slice()).unwrap();
        assert_eq!(decoded, def);
        assert_eq!(decoded.fields[0].logical_type(), LogicalType::Int32);
    }
}
