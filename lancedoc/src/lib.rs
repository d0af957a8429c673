//! lancedoc: documents on a columnar vector store.
//!
//! This crate is the entry point for the lancedoc toolkit. It re-exports the
//! schema builder, the presence-tracking document codec and the filter
//! compiler from the underlying `lancedoc-*` crates, and adds the store
//! description ([`StoreConfig`]) that ties them together.
//!
//! # Quick Start
//!
//! ```rust
//! use lancedoc::{Document, FilterNode, StoreConfig, compile};
//!
//! let config = StoreConfig::from_json(r#"{
//!     "database": "./data",
//!     "table_name": "docs",
//!     "metadata_schema": {"type": "struct", "children": [
//!         {"name": "count", "type": "int32", "nullable": true, "metadata": null}
//!     ]},
//!     "embedding_dims": 2
//! }"#).unwrap();
//! let codec = config.codec(None).unwrap();
//!
//! let batch = codec
//!     .encode_batch(&[Document::new("a").with_meta("count", 5)])
//!     .unwrap();
//! assert_eq!(codec.decode_batch(&batch).unwrap()[0].id, "a");
//!
//! let filter = FilterNode::from_json_str(
//!     r#"{"field": "meta.count", "operator": ">", "value": 3}"#,
//! ).unwrap();
//! let predicate = compile(&filter).unwrap();
//! assert!(predicate.contains("meta._isempty.count = FALSE"));
//! ```
//!
//! # Architecture
//!
//! - **Types** (`lancedoc-types`): documents, metadata values and physical
//!   storage rows.
//! - **Schema** (`lancedoc-schema`): builds the Arrow table schema with its
//!   `_isempty` presence maps.
//! - **Codec** (`lancedoc-codec`): documents to rows and `RecordBatch`es and
//!   back.
//! - **Filter** (`lancedoc-filter`): filter trees to SQL predicates.

mod config;

pub use config::{DuplicatePolicy, StoreConfig};

pub use lancedoc_codec::{
    DocumentCodec, decode_row, encode_document, record_batch_to_rows, rows_to_record_batch,
};
pub use lancedoc_filter::{
    ComparisonOp, FilterNode, FilterValue, LogicalOp, Predicate, compile, compile_json,
    delete_predicate, lower,
};
pub use lancedoc_result::{Error, Result};
pub use lancedoc_schema::{FieldDict, SchemaBuilder, SchemaDict, build_root_schema, columns};
pub use lancedoc_types::{
    DataFrame, Document, MetaValue, Metadata, StorageRow, StorageValue, StructValue,
};
