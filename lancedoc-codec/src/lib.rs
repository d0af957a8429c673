//! Presence-tracking document codec.
//!
//! Columnar storage needs every row to carry every declared column, while a
//! document may omit most of them. Encoding fills each gap with a placeholder
//! and records the gap in the sibling `_isempty` map of the enclosing struct:
//!
//! ```text
//! Document { id: "a", meta: { count: 5 } }
//!
//! row.id                  = "a"
//! row.vector              = [0.0, 0.0]     _isempty.vector = true
//! row.content             = null           _isempty.content = true
//! row.meta.count          = 5              meta._isempty.count = false
//! ```
//!
//! Decoding consults the flags, so a declared `null` is kept while a missing
//! field stays missing. [`DocumentCodec`] bundles both directions with the
//! `RecordBatch` conversion for a fixed table schema.

#![forbid(unsafe_code)]

pub mod batch;
mod convert;
pub mod decoder;
pub mod encoder;
mod presence;

pub use batch::{record_batch_to_rows, rows_to_record_batch};
pub use decoder::decode_row;
pub use encoder::encode_document;

use arrow::array::RecordBatch;
use arrow::datatypes::SchemaRef;
use lancedoc_result::Result;
use lancedoc_schema::{embedding_dims, metadata_fields};
use lancedoc_types::{Document, StorageRow};

/// Encoder and decoder bound to one table schema.
#[derive(Debug, Clone)]
pub struct DocumentCodec {
    schema: SchemaRef,
    embedding_dims: usize,
}

impl DocumentCodec {
    /// Bind to `schema`, which must carry the `vector` and `meta` columns.
    pub fn new(schema: SchemaRef) -> Result<Self> {
        let embedding_dims = embedding_dims(&schema)?;
        metadata_fields(&schema)?;
        Ok(Self {
            schema,
            embedding_dims,
        })
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn embedding_dims(&self) -> usize {
        self.embedding_dims
    }

    pub fn encode(&self, document: &Document) -> Result<StorageRow> {
        encode_document(document, &self.schema)
    }

    pub fn decode(&self, row: &StorageRow) -> Result<Document> {
        decode_row(row, &self.schema)
    }

    /// Encode `documents` into a single batch.
    pub fn encode_batch(&self, documents: &[Document]) -> Result<RecordBatch> {
        let rows = documents
            .iter()
            .map(|document| self.encode(document))
            .collect::<Result<Vec<_>>>()?;
        rows_to_record_batch(&self.schema, &rows)
    }

    /// Decode every row of `batch`. Extra columns such as `_distance` are
    /// allowed and feed the document score.
    pub fn decode_batch(&self, batch: &RecordBatch) -> Result<Vec<Document>> {
        record_batch_to_rows(batch)?
            .iter()
            .map(|row| self.decode(row))
            .collect()
    }
}
