//! Storage row to document.

use arrow::datatypes::{Fields, Schema};
use lancedoc_result::{Error, Result};
use lancedoc_schema::metadata_fields;
use lancedoc_types::columns::{
    BLOB_COLUMN, CONTENT_COLUMN, DATAFRAME_COLUMN, DISTANCE_COLUMN, ID_COLUMN, ISEMPTY_COLUMN,
    META_COLUMN, SCORE_COLUMN, VECTOR_COLUMN,
};
use lancedoc_types::{DataFrame, Document, MetaValue, Metadata, StorageRow, StorageValue, StructValue};

use crate::convert::{leaf_from_storage, struct_children};
use crate::presence::is_present;

/// Decode a stored row back into a document.
///
/// Only fields flagged present are reconstructed. A field that is present and
/// null comes back as [`MetaValue::Null`]. `score` is taken from a `score`
/// column when the row has one, otherwise from `_distance`.
pub fn decode_row(row: &StorageRow, schema: &Schema) -> Result<Document> {
    let meta_fields = metadata_fields(schema)?;

    let id = match row.get(ID_COLUMN) {
        Some(StorageValue::Utf8(id)) => id.clone(),
        Some(other) => {
            return Err(Error::validation(format!(
                "stored '{ID_COLUMN}' is {}, expected utf8",
                other.type_name()
            )));
        }
        None => {
            return Err(Error::validation(format!(
                "stored row has no '{ID_COLUMN}' column"
            )));
        }
    };

    let mut document = Document::new(id);
    document.content = present_root(row, CONTENT_COLUMN)?
        .map(|value| expect_utf8(value, CONTENT_COLUMN))
        .transpose()?
        .flatten();
    document.blob = match present_root(row, BLOB_COLUMN)? {
        Some(StorageValue::Binary(bytes)) => Some(bytes.clone()),
        Some(StorageValue::Null) | None => None,
        Some(other) => return Err(unexpected(BLOB_COLUMN, "binary", other)),
    };
    document.dataframe = present_root(row, DATAFRAME_COLUMN)?
        .map(|value| expect_utf8(value, DATAFRAME_COLUMN))
        .transpose()?
        .flatten()
        .map(|text| DataFrame::from_canonical_json(&text))
        .transpose()?;
    document.embedding = match present_root(row, VECTOR_COLUMN)? {
        Some(StorageValue::Vector(values)) => Some(values.clone()),
        Some(StorageValue::Null) | None => None,
        Some(other) => return Err(unexpected(VECTOR_COLUMN, "vector", other)),
    };
    document.meta = match present_root(row, META_COLUMN)? {
        Some(StorageValue::Struct(meta)) => decode_struct(meta, meta_fields, META_COLUMN)?,
        Some(StorageValue::Null) | None => Metadata::new(),
        Some(other) => return Err(unexpected(META_COLUMN, "struct", other)),
    };
    document.score = row
        .get(SCORE_COLUMN)
        .or_else(|| row.get(DISTANCE_COLUMN))
        .and_then(StorageValue::as_f64);

    Ok(document)
}

/// The value of a root column if it is flagged present.
fn present_root<'a>(row: &'a StorageRow, name: &str) -> Result<Option<&'a StorageValue>> {
    if row.get(ISEMPTY_COLUMN).is_none() {
        return Err(Error::validation(format!(
            "stored row has no root '{ISEMPTY_COLUMN}' map"
        )));
    }
    if !is_present(row, name, "<root>")? {
        return Ok(None);
    }
    row.get(name)
        .map(Some)
        .ok_or_else(|| Error::validation(format!("stored row has no '{name}' column")))
}

fn expect_utf8(value: &StorageValue, column: &str) -> Result<Option<String>> {
    match value {
        StorageValue::Utf8(text) => Ok(Some(text.clone())),
        StorageValue::Null => Ok(None),
        other => Err(unexpected(column, "utf8", other)),
    }
}

fn unexpected(column: &str, expected: &str, found: &StorageValue) -> Error {
    Error::validation(format!(
        "stored '{column}' is {}, expected {expected}",
        found.type_name()
    ))
}

fn decode_struct(value: &StructValue, fields: &Fields, path: &str) -> Result<Metadata> {
    let mut out = Metadata::new();
    for field in fields.iter().filter(|f| f.name() != ISEMPTY_COLUMN) {
        if !is_present(value, field.name(), path)? {
            continue;
        }
        let child_path = format!("{path}.{}", field.name());
        let stored = value.get(field.name()).ok_or_else(|| {
            Error::validation(format!("stored struct has no member '{child_path}'"))
        })?;
        let logical = match (struct_children(field), stored) {
            (Some(children), StorageValue::Struct(inner)) => {
                MetaValue::Map(decode_struct(inner, children, &child_path)?)
            }
            (Some(_), StorageValue::Null) => MetaValue::Null,
            (Some(_), other) => return Err(unexpected(&child_path, "struct", other)),
            (None, leaf) => leaf_from_storage(leaf, &child_path)?,
        };
        out.insert(field.name().clone(), logical);
    }
    Ok(out)
}
