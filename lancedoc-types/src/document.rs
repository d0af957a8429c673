//! Application-level document model.
//!
//! A [`Document`] is what callers write and read. Every field except `id` is
//! optional, and metadata is an arbitrarily nested mapping of [`MetaValue`]s
//! whose leaf types are checked against the declared metadata schema when the
//! document is encoded.

use std::collections::BTreeMap;

use time::OffsetDateTime;

use crate::dataframe::DataFrame;

/// Nested metadata mapping. Keys are kept sorted so iteration is
/// deterministic.
pub type Metadata = BTreeMap<String, MetaValue>;

/// A metadata value.
///
/// `Null` is a *declared* null: the key is present with no value. It is
/// distinct from a missing key, which is how absence is expressed.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Native date-time. Timestamp columns also accept ISO-8601 strings.
    Timestamp(OffsetDateTime),
    Bytes(Vec<u8>),
    Map(Metadata),
}

macro_rules! impl_from_for_meta_value {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for MetaValue {
                fn from(v: $t) -> Self {
                    MetaValue::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_meta_value!(Int, i8, i16, i32, i64, u8, u16, u32);
impl_from_for_meta_value!(Float, f32, f64);
impl_from_for_meta_value!(String, String);
impl_from_for_meta_value!(Bool, bool);
impl_from_for_meta_value!(Bytes, Vec<u8>);
impl_from_for_meta_value!(Timestamp, OffsetDateTime);
impl_from_for_meta_value!(Map, Metadata);

impl From<&str> for MetaValue {
    fn from(v: &str) -> Self {
        MetaValue::String(v.to_string())
    }
}

impl MetaValue {
    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            MetaValue::Null => "null",
            MetaValue::Bool(_) => "bool",
            MetaValue::Int(_) => "int",
            MetaValue::Float(_) => "float",
            MetaValue::String(_) => "string",
            MetaValue::Timestamp(_) => "timestamp",
            MetaValue::Bytes(_) => "bytes",
            MetaValue::Map(_) => "map",
        }
    }

    pub fn as_map(&self) -> Option<&Metadata> {
        match self {
            MetaValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// A stored document.
///
/// `score` is only ever populated by query results. It is stripped before a
/// document is encoded and is never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub id: String,
    pub content: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub dataframe: Option<DataFrame>,
    pub blob: Option<Vec<u8>>,
    pub meta: Metadata,
    pub score: Option<f64>,
}

impl Document {
    /// Create an otherwise empty document with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_dataframe(mut self, dataframe: DataFrame) -> Self {
        self.dataframe = Some(dataframe);
        self
    }

    pub fn with_blob(mut self, blob: Vec<u8>) -> Self {
        self.blob = Some(blob);
        self
    }

    /// Insert a top-level metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Copy of this document with the transient score removed.
    pub fn without_score(&self) -> Self {
        Self {
            score: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let doc = Document::new("doc-1")
            .with_content("hello")
            .with_embedding(vec![0.5, 0.25])
            .with_meta("count", 5)
            .with_meta("name", "alpha");

        assert_eq!(doc.id, "doc-1");
        assert_eq!(doc.content.as_deref(), Some("hello"));
        assert_eq!(doc.embedding, Some(vec![0.5, 0.25]));
        assert_eq!(doc.meta.get("count"), Some(&MetaValue::Int(5)));
        assert_eq!(
            doc.meta.get("name"),
            Some(&MetaValue::String("alpha".into()))
        );
        assert!(doc.dataframe.is_none());
        assert!(doc.blob.is_none());
        assert!(doc.score.is_none());
    }

    #[test]
    fn without_score_clears_only_score() {
        let mut doc = Document::new("a").with_content("x");
        doc.score = Some(0.75);
        let stripped = doc.without_score();
        assert!(stripped.score.is_none());
        assert_eq!(stripped.content, doc.content);
    }

    #[test]
    fn declared_null_is_not_absent() {
        let doc = Document::new("a").with_meta("maybe", MetaValue::Null);
        assert!(doc.meta.contains_key("maybe"));
        assert!(!doc.meta.contains_key("other"));
    }
}
