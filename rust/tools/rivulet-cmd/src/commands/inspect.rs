//! Inspect command implementation

use anyhow::{Context, Result};
use rivulet_format::{FieldSchema, Row, value::logical_type_label};
use serde::Serialize;

use crate::{commands::open_container, utils};

#[derive(Serialize)]
struct InspectSummary {
    file_size: u64,
    file_size_text: String,
    sync_marker: String,
    schema: SchemaInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<PropertyInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<DataInfo>,
}

#[derive(Serialize)]
struct SchemaInfo {
    record_name: String,
    field_count: usize,
    fields: Vec<FieldInfo>,
}

#[derive(Serialize)]
struct FieldInfo {
    name: String,
    #[serde(rename = "type")]
    logical_type: &'static str,
    nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_name: Option<String>,
    source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    precision: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scale: Option<i32>,
}

#[derive(Serialize)]
struct PropertyInfo {
    name: String,
    value: String,
}

#[derive(Serialize)]
struct DataInfo {
    row_count: u64,
    block_count: u64,
}

/// Run the inspect command
pub fn run(full: bool, path: String) -> Result<()> {
    let file_size = std::fs::metadata(&path)
        .with_context(|| format!("Failed to stat {path}"))?
        .len();
    let mut reader = open_container(&path)?;

    let data = if full {
        let mut row = Row::with_capacity(reader.schema().len());
        while reader
            .next_row(&mut row)
            .with_context(|| format!("Failed to read row {}", reader.rows_read() + 1))?
        {}
        Some(DataInfo {
            row_count: reader.rows_read(),
            block_count: reader.blocks_read(),
        })
    } else {
        None
    };

    let schema = reader.schema();
    let summary = InspectSummary {
        file_size,
        file_size_text: utils::format_size(file_size),
        sync_marker: reader
            .sync_marker()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect(),
        schema: SchemaInfo {
            record_name: schema.name().to_string(),
            field_count: schema.len(),
            fields: schema.fields().iter().map(create_field_info).collect(),
        },
        properties: reader
            .properties()
            .iter()
            .map(|(name, value)| PropertyInfo {
                name: name.clone(),
                value: value.clone(),
            })
            .collect(),
        data,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn create_field_info(field: &FieldSchema) -> FieldInfo {
    FieldInfo {
        name: field.name.clone(),
        logical_type: logical_type_label(field.logical_type),
        nullable: field.nullable,
        source_name: (field.source_name != field.name).then(|| field.source_name.clone()),
        source_type: if field.source_type_name.is_empty() {
            format!("{:?}", field.source_type)
        } else {
            field.source_type_name.clone()
        },
        precision: (field.precision != 0).then_some(field.precision),
        scale: (field.scale != 0).then_some(field.scale),
    }
}
