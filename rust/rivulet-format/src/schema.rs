use ahash::AHashSet;
use rivulet_common::{Result, error::Error};

use crate::{
    defs::{FieldDef, SchemaDef},
    sql_type::SqlType,
};

pub use crate::defs::LogicalType;

/// One field of the record schema, derived from one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    /// Normalized output name, unique within the record.
    pub name: String,
    /// Column label as reported by the driver.
    pub source_name: String,
    pub logical_type: LogicalType,
    pub nullable: bool,
    pub source_type: SqlType,
    pub source_type_name: String,
    pub precision: u32,
    pub scale: i32,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, logical_type: LogicalType, nullable: bool) -> FieldSchema {
        let name = name.into();
        FieldSchema {
            source_name: name.clone(),
            name,
            logical_type,
            nullable,
            source_type: SqlType::Other(SqlType::OTHER_CODE),
            source_type_name: String::new(),
            precision: 0,
            scale: 0,
        }
    }

    fn to_def(&self) -> FieldDef {
        FieldDef {
            name: self.name.clone(),
            source_name: self.source_name.clone(),
            logical_type: self.logical_type.into(),
            nullable: self.nullable,
            source_type_code: self.source_type.code(),
            source_type_name: self.source_type_name.clone(),
            precision: self.precision,
            scale: self.scale,
        }
    }

    fn from_def(def: FieldDef) -> Result<FieldSchema> {
        let logical_type = LogicalType::try_from(def.logical_type).map_err(|_| {
            Error::invalid_format_msg(
                "schema",
                format!(
                    "field '{}' has unknown logical type {}",
                    def.name, def.logical_type
                ),
            )
        })?;
        Ok(FieldSchema {
            name: def.name,
            source_name: def.source_name,
            logical_type,
            nullable: def.nullable,
            source_type: SqlType::from_code(def.source_type_code),
            source_type_name: def.source_type_name,
            precision: def.precision,
            scale: def.scale,
        })
    }
}

/// Ordered record schema embedded in the container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    name: String,
    fields: Vec<FieldSchema>,
}

impl RecordSchema {
    /// Creates a schema from already-normalized fields.
    ///
    /// # Errors
    ///
    /// Returns a schema error if there are no fields, or if a field name is
    /// empty or duplicated.
    pub fn new(name: impl Into<String>, fields: Vec<FieldSchema>) -> Result<RecordSchema> {
        if fields.is_empty() {
            return Err(Error::schema("record schema must have at least one field"));
        }
        let mut names = AHashSet::with_capacity(fields.len());
        for field in &fields {
            if field.name.is_empty() {
                return Err(Error::schema("empty field name"));
            }
            if !names.insert(field.name.as_str()) {
                return Err(Error::schema(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }
        Ok(RecordSchema {
            name: name.into(),
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_at(&self, index: usize) -> Option<&FieldSchema> {
        self.fields.get(index)
    }

    /// Finds the field with the specified output name, returning its position
    /// and the field itself.
    pub fn find_field(&self, name: &str) -> Option<(usize, &FieldSchema)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.name == name)
    }

    pub fn to_def(&self) -> SchemaDef {
        SchemaDef {
            record_name: self.name.clone(),
            fields: self.fields.iter().map(FieldSchema::to_def).collect(),
        }
    }

    /// Rebuilds a schema from its header message.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` for an unknown logical type, `Schema` for an empty or
    /// inconsistent field list.
    pub fn from_def(def: SchemaDef) -> Result<RecordSchema> {
        let fields = def
            .fields
            .into_iter()
            .map(FieldSchema::from_def)
            .collect::<Result<Vec<_>>>()?;
        RecordSchema::new(def.record_name, fields)
    }
}
