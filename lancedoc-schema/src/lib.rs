//! Table schema construction for lancedoc.
//!
//! The document table has a fixed root layout wrapped around a user-declared
//! metadata struct:
//!
//! ```text
//! _isempty  struct<blob, content, dataframe, id, meta, vector: bool>
//! blob      binary
//! content   utf8
//! dataframe utf8
//! id        utf8 (not null)
//! meta      struct<_isempty: struct<..>, ...user fields sorted by name>
//! vector    fixed_size_list<float32>[embedding_dims] (not null)
//! ```
//!
//! [`SchemaBuilder`] derives this layout, [`root`] reads it back from an
//! existing (possibly reordered) schema, and [`dict`] converts metadata
//! schemas to and from the serializable [`SchemaDict`] form.

pub mod builder;
pub mod dict;
pub mod root;

pub use builder::{SchemaBuilder, build_root_schema, canonicalize_metadata};
pub use dict::{FieldDict, SchemaDict};
pub use root::{embedding_dims, metadata_fields};

pub use lancedoc_types::columns;
