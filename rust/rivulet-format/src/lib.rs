//! Container format definitions: header constants and messages, the logical
//! type system, column metadata, record schemas and the mapping between them.

pub mod checksum;
pub mod defs;
pub mod schema;
pub mod schema_builder;
pub mod sql_type;
pub mod type_mapper;
pub mod value;

pub use defs::LogicalType;
pub use schema::{FieldSchema, RecordSchema};
pub use schema_builder::{NameCollisionPolicy, SchemaBuilder, SchemaBuilderParams, build_schema};
pub use sql_type::{ColumnDescriptor, SqlType};
pub use type_mapper::map_column;
pub use value::{Row, Value};
