//! Root schema derivation.
//!
//! Every struct level of the metadata schema is sorted by field name and gets
//! a synthetic `_isempty` struct at its head whose boolean members mirror the
//! sorted sibling names. The transform is pure and deterministic: the same
//! metadata definition always yields an identical schema.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, FieldRef, Fields, Schema, SchemaRef, TimeUnit};
use lancedoc_result::{Error, Result};
use lancedoc_types::columns::{
    BLOB_COLUMN, CONTENT_COLUMN, DATAFRAME_COLUMN, ID_COLUMN, ISEMPTY_COLUMN, META_COLUMN,
    ROOT_PRESENCE_COLUMNS, VECTOR_COLUMN,
};
use rustc_hash::FxHashSet;

use crate::root;

/// Collects the inputs needed to create a table schema.
///
/// Both inputs are optional because an existing table can be reopened without
/// them; see [`SchemaBuilder::resolve`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    metadata: Option<Fields>,
    embedding_dims: Option<i64>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: impl Into<Fields>) -> Self {
        self.metadata = Some(metadata.into());
        self
    }

    pub fn with_embedding_dims(mut self, embedding_dims: i64) -> Self {
        self.embedding_dims = Some(embedding_dims);
        self
    }

    /// Build a fresh root schema. Both inputs are required.
    pub fn build(&self) -> Result<SchemaRef> {
        let metadata = self.metadata.as_ref().ok_or_else(|| {
            Error::configuration("metadata_schema is required to create a table schema")
        })?;
        let embedding_dims = self.embedding_dims.ok_or_else(|| {
            Error::configuration("embedding_dims is required to create a table schema")
        })?;
        build_root_schema(metadata, embedding_dims)
    }

    /// Reuse `existing` when a persisted schema is available, otherwise build
    /// one.
    ///
    /// The existing schema is authoritative: it is only checked for the
    /// columns the codec relies on, never rebuilt.
    pub fn resolve(&self, existing: Option<SchemaRef>) -> Result<SchemaRef> {
        match existing {
            Some(schema) => {
                root::embedding_dims(&schema)?;
                root::metadata_fields(&schema)?;
                tracing::debug!(
                    fields = schema.fields().len(),
                    "reusing persisted table schema"
                );
                Ok(schema)
            }
            None => self.build(),
        }
    }
}

/// Build the root table schema for `metadata` and `embedding_dims`.
pub fn build_root_schema(metadata: &Fields, embedding_dims: i64) -> Result<SchemaRef> {
    if embedding_dims <= 0 {
        return Err(Error::configuration(format!(
            "embedding_dims must be a positive integer, got {embedding_dims}"
        )));
    }
    let list_size = i32::try_from(embedding_dims).map_err(|_| {
        Error::configuration(format!(
            "embedding_dims {embedding_dims} exceeds the maximum fixed-size list length"
        ))
    })?;

    let meta = canonicalize_metadata(metadata)?;
    let vector_item = Arc::new(Field::new("item", DataType::Float32, true));

    let fields = vec![
        presence_field(ROOT_PRESENCE_COLUMNS.iter().copied()),
        Field::new(BLOB_COLUMN, DataType::Binary, true),
        Field::new(CONTENT_COLUMN, DataType::Utf8, true),
        Field::new(DATAFRAME_COLUMN, DataType::Utf8, true),
        Field::new(ID_COLUMN, DataType::Utf8, false),
        Field::new(META_COLUMN, DataType::Struct(meta), false),
        Field::new(
            VECTOR_COLUMN,
            DataType::FixedSizeList(vector_item, list_size),
            false,
        ),
    ];

    tracing::debug!(
        embedding_dims,
        metadata_fields = metadata.len(),
        "built document table schema"
    );
    Ok(Arc::new(Schema::new(fields)))
}

/// Sort every struct level of `metadata` by name and inject the `_isempty`
/// presence struct at the head of each level.
pub fn canonicalize_metadata(metadata: &Fields) -> Result<Fields> {
    canonicalize_struct(metadata, META_COLUMN)
}

fn canonicalize_struct(fields: &Fields, path: &str) -> Result<Fields> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut children: Vec<FieldRef> = Vec::with_capacity(fields.len() + 1);

    for field in fields.iter() {
        let name = field.name().as_str();
        if name == ISEMPTY_COLUMN {
            return Err(Error::configuration(format!(
                "field name '{ISEMPTY_COLUMN}' is reserved (in '{path}')"
            )));
        }
        if name.is_empty() {
            return Err(Error::configuration(format!(
                "empty field name in '{path}'"
            )));
        }
        if !seen.insert(name) {
            return Err(Error::configuration(format!(
                "duplicate field '{name}' in '{path}'"
            )));
        }
        children.push(Arc::new(canonicalize_field(field, path)?));
    }

    children.sort_by(|a, b| a.name().cmp(b.name()));

    let presence = presence_field(children.iter().map(|f| f.name().as_str()));
    let mut out = Vec::with_capacity(children.len() + 1);
    out.push(Arc::new(presence));
    out.extend(children);
    Ok(Fields::from(out))
}

fn canonicalize_field(field: &Field, parent: &str) -> Result<Field> {
    let path = format!("{parent}.{}", field.name());
    match field.data_type() {
        DataType::Struct(children) => {
            let canonical = canonicalize_struct(children, &path)?;
            Ok(field.clone().with_data_type(DataType::Struct(canonical)))
        }
        data_type if is_metadata_leaf(data_type) => Ok(field.clone()),
        other => Err(Error::configuration(format!(
            "unsupported metadata type {other} for field '{path}'"
        ))),
    }
}

/// Leaf types a metadata field may declare. Timestamps are stored as naive
/// UTC seconds, so a declared timezone is rejected.
pub(crate) fn is_metadata_leaf(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Utf8
            | DataType::Int32
            | DataType::Int64
            | DataType::Float32
            | DataType::Float64
            | DataType::Boolean
            | DataType::Binary
            | DataType::Timestamp(TimeUnit::Second, None)
    )
}

fn presence_field<'a>(names: impl Iterator<Item = &'a str>) -> Field {
    let flags: Vec<Field> = names
        .map(|name| Field::new(name, DataType::Boolean, false))
        .collect();
    Field::new(ISEMPTY_COLUMN, DataType::Struct(Fields::from(flags)), false)
}
