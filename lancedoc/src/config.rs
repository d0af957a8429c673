//! Store description.

use arrow::datatypes::SchemaRef;
use lancedoc_codec::DocumentCodec;
use lancedoc_result::{Error, Result};
use lancedoc_schema::{SchemaBuilder, SchemaDict};
use lancedoc_types::Document;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a write does with a document whose id is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Store default, which is [`DuplicatePolicy::Overwrite`].
    #[default]
    None,
    /// Keep the stored document and drop the incoming one.
    Skip,
    /// Replace the stored document.
    Overwrite,
    /// Reject the whole write.
    Fail,
}

impl DuplicatePolicy {
    /// Replace [`DuplicatePolicy::None`] with the store default.
    pub fn resolve(self) -> Self {
        match self {
            DuplicatePolicy::None => DuplicatePolicy::Overwrite,
            other => other,
        }
    }

    /// Select the documents a write under this policy should send to the
    /// engine's merge-insert keyed on `id`.
    ///
    /// `existing` holds the ids already stored. Repeated ids inside one write
    /// are duplicates too: `Overwrite` keeps the last occurrence, `Skip` the
    /// first, and `Fail` rejects them.
    pub fn select<'a>(
        self,
        documents: &'a [Document],
        existing: &FxHashSet<String>,
    ) -> Result<Vec<&'a Document>> {
        let policy = self.resolve();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut selected: Vec<&Document> = Vec::with_capacity(documents.len());

        let ordered: Box<dyn Iterator<Item = &'a Document> + 'a> = match policy {
            DuplicatePolicy::Overwrite => Box::new(documents.iter().rev()),
            _ => Box::new(documents.iter()),
        };
        for document in ordered {
            let id = document.id.as_str();
            let stored = existing.contains(id);
            let repeated = !seen.insert(id);
            match policy {
                DuplicatePolicy::Fail if stored || repeated => {
                    return Err(Error::Duplicate(format!(
                        "document with id '{id}' already exists"
                    )));
                }
                DuplicatePolicy::Skip if stored || repeated => continue,
                DuplicatePolicy::Overwrite if repeated => continue,
                _ => selected.push(document),
            }
        }
        if policy == DuplicatePolicy::Overwrite {
            selected.reverse();
        }

        debug!(
            ?policy,
            incoming = documents.len(),
            selected = selected.len(),
            "applied duplicate policy"
        );
        Ok(selected)
    }
}

/// Serializable description of a document store.
///
/// ```json
/// {"database": "./data", "table_name": "docs",
///  "metadata_schema": {"type": "struct", "children": [...]},
///  "embedding_dims": 768, "duplicate_policy": "overwrite"}
/// ```
///
/// `metadata_schema` and `embedding_dims` are only needed to create a new
/// table. An existing table's schema always takes precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub database: String,
    pub table_name: String,
    #[serde(default)]
    pub metadata_schema: Option<SchemaDict>,
    #[serde(default)]
    pub embedding_dims: Option<i64>,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl StoreConfig {
    pub fn new(database: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table_name: table_name.into(),
            metadata_schema: None,
            embedding_dims: None,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }

    pub fn with_metadata_schema(mut self, schema: SchemaDict) -> Self {
        self.metadata_schema = Some(schema);
        self
    }

    pub fn with_embedding_dims(mut self, embedding_dims: i64) -> Self {
        self.embedding_dims = Some(embedding_dims);
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        if config.table_name.is_empty() {
            return Err(Error::configuration("table_name must not be empty"));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The table schema: `existing` when the table is already stored,
    /// otherwise one built from the declared metadata schema and width.
    pub fn root_schema(&self, existing: Option<SchemaRef>) -> Result<SchemaRef> {
        let mut builder = SchemaBuilder::new();
        if let Some(dict) = &self.metadata_schema {
            builder = builder.with_metadata(dict.to_fields()?);
        }
        if let Some(dims) = self.embedding_dims {
            builder = builder.with_embedding_dims(dims);
        }
        builder.resolve(existing)
    }

    /// A codec bound to [`StoreConfig::root_schema`].
    pub fn codec(&self, existing: Option<SchemaRef>) -> Result<DocumentCodec> {
        DocumentCodec::new(self.root_schema(existing)?)
    }
}
