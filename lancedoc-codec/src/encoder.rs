//! Document to storage row.

use arrow::datatypes::{Field, Fields, Schema};
use lancedoc_result::{Error, Result};
use lancedoc_schema::{embedding_dims, metadata_fields};
use lancedoc_types::columns::{
    BLOB_COLUMN, CONTENT_COLUMN, DATAFRAME_COLUMN, ID_COLUMN, ISEMPTY_COLUMN, META_COLUMN,
    VECTOR_COLUMN,
};
use lancedoc_types::{Document, MetaValue, Metadata, StorageRow, StorageValue, StructValue};
use tracing::trace;

use crate::convert::{leaf_placeholder, leaf_to_storage, struct_children, zero_value};
use crate::presence::{PresenceWriter, Slot};

/// Encode `document` into a fully populated row for `schema`.
///
/// Every root column and every declared metadata field receives a value.
/// Absent values are replaced by placeholders and flagged in the sibling
/// `_isempty` map. Any `score` is dropped. Metadata keys the schema does not
/// declare are dropped too.
pub fn encode_document(document: &Document, schema: &Schema) -> Result<StorageRow> {
    let dims = embedding_dims(schema)?;
    let meta_fields = metadata_fields(schema)?;

    if document.id.is_empty() {
        return Err(Error::validation("document id must not be empty"));
    }

    let mut root = PresenceWriter::with_capacity(schema.fields().len());
    for field in schema.fields().iter() {
        let name = field.name().as_str();
        let slot = match name {
            ISEMPTY_COLUMN => continue,
            ID_COLUMN => Slot::present(StorageValue::Utf8(document.id.clone())),
            CONTENT_COLUMN => optional(
                document.content.clone().map(StorageValue::Utf8),
                field,
            )?,
            BLOB_COLUMN => optional(document.blob.clone().map(StorageValue::Binary), field)?,
            DATAFRAME_COLUMN => optional(
                document
                    .dataframe
                    .as_ref()
                    .map(|frame| StorageValue::Utf8(frame.to_canonical_json())),
                field,
            )?,
            VECTOR_COLUMN => encode_vector(document, dims)?,
            META_COLUMN => Slot::present(StorageValue::Struct(encode_struct(
                Some(&document.meta),
                meta_fields,
                META_COLUMN,
            )?)),
            other => {
                return Err(Error::configuration(format!(
                    "table schema has an unexpected root column '{other}'"
                )));
            }
        };
        root.push(name, slot);
    }

    Ok(root.finish())
}

fn optional(value: Option<StorageValue>, field: &Field) -> Result<Slot> {
    match value {
        Some(value) => Ok(Slot::present(value)),
        None => Ok(Slot::absent(leaf_placeholder(field, field.name())?)),
    }
}

fn encode_vector(document: &Document, dims: usize) -> Result<Slot> {
    match &document.embedding {
        Some(embedding) if embedding.len() == dims => {
            Ok(Slot::present(StorageValue::Vector(embedding.clone())))
        }
        Some(embedding) => Err(Error::validation(format!(
            "document '{}' has an embedding of length {}, expected {dims}",
            document.id,
            embedding.len()
        ))),
        None => Ok(Slot::absent(StorageValue::Vector(vec![0.0; dims]))),
    }
}

/// Encode one metadata struct level against its declared `fields`.
///
/// `value` is `None` when the whole struct is absent, in which case every
/// member becomes a flagged placeholder.
fn encode_struct(value: Option<&Metadata>, fields: &Fields, path: &str) -> Result<StructValue> {
    let mut writer = PresenceWriter::with_capacity(fields.len());
    for field in fields.iter().filter(|f| f.name() != ISEMPTY_COLUMN) {
        let child_path = format!("{path}.{}", field.name());
        let slot = match value.and_then(|map| map.get(field.name())) {
            Some(child) => Slot::present(encode_value(child, field, &child_path)?),
            None => {
                trace!(path = child_path.as_str(), "writing placeholder for absent field");
                Slot::absent(placeholder(field, &child_path)?)
            }
        };
        writer.push(field.name(), slot);
    }

    if let Some(map) = value {
        for key in map.keys() {
            if fields.find(key).is_none() {
                trace!(path, key = key.as_str(), "dropping undeclared metadata key");
            }
        }
    }

    Ok(writer.finish())
}

fn encode_value(value: &MetaValue, field: &Field, path: &str) -> Result<StorageValue> {
    match (struct_children(field), value) {
        (Some(children), MetaValue::Map(map)) => {
            Ok(StorageValue::Struct(encode_struct(Some(map), children, path)?))
        }
        (Some(_), MetaValue::Null) => leaf_to_storage(value, field, path),
        (Some(_), other) => Err(Error::validation(format!(
            "'{path}' is declared as a struct, cannot store a {} value",
            other.type_name()
        ))),
        (None, _) => leaf_to_storage(value, field, path),
    }
}

/// Placeholder for an absent field. Absent structs are still written out in
/// full, with every member flagged absent.
fn placeholder(field: &Field, path: &str) -> Result<StorageValue> {
    match struct_children(field) {
        Some(children) => Ok(StorageValue::Struct(encode_struct(None, children, path)?)),
        None if field.is_nullable() => Ok(StorageValue::Null),
        None => zero_value(field.data_type(), path),
    }
}
