use ahash::AHashSet;
use rivulet_common::{Result, error::Error};

use crate::{
    schema::RecordSchema,
    sql_type::ColumnDescriptor,
    type_mapper::map_column,
};

/// What to do when two columns normalize to the same output name.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameCollisionPolicy {
    /// Fail the schema build with a schema error.
    #[default]
    Reject,

    /// Rename the later column to `<name>_<position>` (1-based column
    /// position), adding a further `_<k>` counter if that name is taken too.
    PositionalSuffix,
}

/// Configuration for [`SchemaBuilder`].
#[derive(Debug, Clone)]
pub struct SchemaBuilderParams {
    /// Name of the record type embedded in the header.
    pub record_name: String,
    pub collision_policy: NameCollisionPolicy,
}

impl Default for SchemaBuilderParams {
    fn default() -> Self {
        SchemaBuilderParams {
            record_name: "query_result".to_string(),
            collision_policy: NameCollisionPolicy::Reject,
        }
    }
}

/// Builds the record schema from the column descriptors of a cursor.
///
/// Invoked once per encode session, before any row is read.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    params: SchemaBuilderParams,
}

impl SchemaBuilder {
    pub fn new(params: SchemaBuilderParams) -> SchemaBuilder {
        SchemaBuilder { params }
    }

    pub fn params(&self) -> &SchemaBuilderParams {
        &self.params
    }

    /// Maps every column, in order, and assigns unique output names.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `columns` is empty, or if two columns
    /// normalize to the same name under [`NameCollisionPolicy::Reject`].
    pub fn build(&self, columns: &[ColumnDescriptor]) -> Result<RecordSchema> {
        if columns.is_empty() {
            return Err(Error::schema("cursor reports no columns"));
        }

        let mut taken = AHashSet::<String>::with_capacity(columns.len());
        let mut fields = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let position = index + 1;
            let mut field = map_column(column);
            let normalized = normalize_name(&column.name, position);
            field.name = if taken.contains(&normalized) {
                self.resolve_collision(&taken, normalized, column, position)?
            } else {
                normalized
            };
            taken.insert(field.name.clone());
            fields.push(field);
        }

        RecordSchema::new(self.record_name(), fields)
    }

    /// The normalized record name; an empty name falls back to the default.
    fn record_name(&self) -> String {
        if self.params.record_name.is_empty() {
            SchemaBuilderParams::default().record_name
        } else {
            normalize_name(&self.params.record_name, 0)
        }
    }

    fn resolve_collision(
        &self,
        taken: &AHashSet<String>,
        normalized: String,
        column: &ColumnDescriptor,
        position: usize,
    ) -> Result<String> {
        match self.params.collision_policy {
            NameCollisionPolicy::Reject => Err(Error::schema(format!(
                "column {position} ('{}') normalizes to '{normalized}', \
                 which is already used by an earlier column",
                column.name
            ))),
            NameCollisionPolicy::PositionalSuffix => {
                let base = format!("{normalized}_{position}");
                let mut candidate = base.clone();
                let mut counter = 2;
                while taken.contains(&candidate) {
                    candidate = format!("{base}_{counter}");
                    counter += 1;
                }
                log::debug!(
                    "column {position} ('{}') renamed to '{candidate}' to avoid a collision",
                    column.name
                );
                Ok(candidate)
            }
        }
    }
}

/// Builds the record schema with the default parameters.
pub fn build_schema(columns: &[ColumnDescriptor]) -> Result<RecordSchema> {
    SchemaBuilder::default().build(columns)
}

/// Restricts a column label to `[A-Za-z_][A-Za-z0-9_]*`.
///
/// Disallowed characters become `_` and a leading digit gets a `_` prefix.
/// An empty label becomes `col<position>`.
pub fn normalize_name(label: &str, position: usize) -> String {
    if label.is_empty() {
        return format!("col{position}");
    }
    let mut name = String::with_capacity(label.len() + 1);
    if label.starts_with(|c: char| c.is_ascii_digit()) {
        name.push('_');
    }
    name.extend(label.chars().map(|c| {
        if c.is_ascii_alphanumeric() || c == '_' {
            c
        } else {
            '_'
        }
    }));
    name
}
