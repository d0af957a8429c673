//! Accessors for an existing root schema.
//!
//! Engines may return a schema whose field order differs from the one that
//! was declared, so lookups here are by name only.

use arrow::datatypes::{DataType, Fields, Schema};
use lancedoc_result::{Error, Result};
use lancedoc_types::columns::{META_COLUMN, VECTOR_COLUMN};

/// Width of the fixed-size `vector` column.
pub fn embedding_dims(schema: &Schema) -> Result<usize> {
    let (_, field) = schema.column_with_name(VECTOR_COLUMN).ok_or_else(|| {
        Error::configuration(format!("table schema has no '{VECTOR_COLUMN}' column"))
    })?;
    match field.data_type() {
        DataType::FixedSizeList(item, size) if item.data_type() == &DataType::Float32 => {
            usize::try_from(*size).map_err(|_| {
                Error::configuration(format!("invalid '{VECTOR_COLUMN}' width {size}"))
            })
        }
        other => Err(Error::configuration(format!(
            "'{VECTOR_COLUMN}' column must be fixed_size_list<float32>, found {other}"
        ))),
    }
}

/// Member fields of the `meta` struct, including its `_isempty` map.
pub fn metadata_fields(schema: &Schema) -> Result<&Fields> {
    let (_, field) = schema.column_with_name(META_COLUMN).ok_or_else(|| {
        Error::configuration(format!("table schema has no '{META_COLUMN}' column"))
    })?;
    match field.data_type() {
        DataType::Struct(fields) => Ok(fields),
        other => Err(Error::configuration(format!(
            "'{META_COLUMN}' column must be a struct, found {other}"
        ))),
    }
}
