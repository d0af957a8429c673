//! Physical row values.
//!
//! A [`StorageRow`] is the fully populated record handed to the storage
//! engine. Unlike a [`Document`](crate::Document) it has no missing keys:
//! every declared column holds a value, and the `_isempty` member of each
//! struct records which of those values stand in for an absent field.

use crate::columns::ISEMPTY_COLUMN;

/// A single physical value, tagged with its Arrow storage type.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
    Binary(Vec<u8>),
    /// Whole seconds since the Unix epoch (UTC).
    TimestampSecond(i64),
    /// Fixed-size list of `f32`.
    Vector(Vec<f32>),
    Struct(StructValue),
}

impl StorageValue {
    pub fn is_null(&self) -> bool {
        matches!(self, StorageValue::Null)
    }

    /// Short type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            StorageValue::Null => "null",
            StorageValue::Boolean(_) => "boolean",
            StorageValue::Int32(_) => "int32",
            StorageValue::Int64(_) => "int64",
            StorageValue::Float32(_) => "float32",
            StorageValue::Float64(_) => "float64",
            StorageValue::Utf8(_) => "utf8",
            StorageValue::Binary(_) => "binary",
            StorageValue::TimestampSecond(_) => "timestamp[s]",
            StorageValue::Vector(_) => "vector",
            StorageValue::Struct(_) => "struct",
        }
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            StorageValue::Struct(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StorageValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view used for cross-width comparisons.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StorageValue::Int32(v) => Some(f64::from(*v)),
            StorageValue::Int64(v) => Some(*v as f64),
            StorageValue::Float32(v) => Some(f64::from(*v)),
            StorageValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Exact integer view, `None` for floats and non-numeric values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StorageValue::Int32(v) => Some(i64::from(*v)),
            StorageValue::Int64(v) => Some(*v),
            _ => None,
        }
    }
}

/// Ordered struct value. Member order follows the schema that produced it,
/// but lookups are always by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructValue {
    fields: Vec<(String, StorageValue)>,
}

/// A top-level storage record.
pub type StorageRow = StructValue;

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Append a member. Replaces the value if the name already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: StorageValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: StorageValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&StorageValue> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Remove and return a member.
    pub fn remove(&mut self, name: &str) -> Option<StorageValue> {
        let idx = self.fields.iter().position(|(existing, _)| existing == name)?;
        Some(self.fields.remove(idx).1)
    }

    /// Resolve a dotted path of member names through nested structs.
    ///
    /// Returns `None` when a segment is missing or an intermediate value is
    /// not a struct. A null intermediate struct resolves to `Null`, matching
    /// how a columnar engine propagates nulls through field access.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&StorageValue> {
        let (first, rest) = path.split_first()?;
        let mut current = self.get(first.as_ref())?;
        for segment in rest {
            current = match current {
                StorageValue::Struct(inner) => inner.get(segment.as_ref())?,
                StorageValue::Null => return Some(current),
                _ => return None,
            };
        }
        Some(current)
    }

    /// Read the `_isempty` flag recorded for `name`.
    ///
    /// `None` when this struct carries no presence map or the map has no
    /// boolean entry for `name`.
    pub fn is_flagged_empty(&self, name: &str) -> Option<bool> {
        self.get(ISEMPTY_COLUMN)?.as_struct()?.get(name)?.as_bool()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StorageValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn into_fields(self) -> Vec<(String, StorageValue)> {
        self.fields
    }
}

impl FromIterator<(String, StorageValue)> for StructValue {
    fn from_iter<T: IntoIterator<Item = (String, StorageValue)>>(iter: T) -> Self {
        let mut out = StructValue::new();
        for (name, value) in iter {
            out.insert(name, value);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StructValue {
        let presence = StructValue::new()
            .with("count", StorageValue::Boolean(false))
            .with("tag", StorageValue::Boolean(true));
        let meta = StructValue::new()
            .with(ISEMPTY_COLUMN, StorageValue::Struct(presence))
            .with("count", StorageValue::Int32(5))
            .with("tag", StorageValue::Null);
        StructValue::new()
            .with("id", StorageValue::Utf8("a".into()))
            .with("meta", StorageValue::Struct(meta))
    }

    #[test]
    fn path_lookup_walks_structs() {
        let row = sample();
        assert_eq!(row.get_path(&["meta", "count"]), Some(&StorageValue::Int32(5)));
        assert_eq!(
            row.get_path(&["meta", "_isempty", "tag"]),
            Some(&StorageValue::Boolean(true))
        );
        assert_eq!(row.get_path(&["meta", "missing"]), None);
        assert_eq!(row.get_path(&["id", "nested"]), None);
    }

    #[test]
    fn null_struct_propagates_null() {
        let row = StructValue::new().with("meta", StorageValue::Null);
        assert_eq!(row.get_path(&["meta", "x", "y"]), Some(&StorageValue::Null));
    }

    #[test]
    fn presence_flags_read_from_sibling_map() {
        let row = sample();
        let meta = row.get("meta").and_then(StorageValue::as_struct).unwrap();
        assert_eq!(meta.is_flagged_empty("count"), Some(false));
        assert_eq!(meta.is_flagged_empty("tag"), Some(true));
        assert_eq!(meta.is_flagged_empty("nope"), None);
        assert_eq!(row.is_flagged_empty("meta"), None);
    }

    #[test]
    fn insert_replaces_existing_member() {
        let mut value = StructValue::new().with("a", StorageValue::Int64(1));
        value.insert("a", StorageValue::Int64(2));
        assert_eq!(value.len(), 1);
        assert_eq!(value.get("a"), Some(&StorageValue::Int64(2)));
        assert_eq!(value.remove("a"), Some(StorageValue::Int64(2)));
        assert!(value.is_empty());
    }
}
