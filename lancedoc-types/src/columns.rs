//! Reserved column names of the document table.

/// Primary key column.
pub const ID_COLUMN: &str = "id";
/// Fixed-size embedding column.
pub const VECTOR_COLUMN: &str = "vector";
/// Text content column.
pub const CONTENT_COLUMN: &str = "content";
/// Canonical JSON encoding of a tabular payload.
pub const DATAFRAME_COLUMN: &str = "dataframe";
/// Raw bytes column.
pub const BLOB_COLUMN: &str = "blob";
/// User-declared metadata struct.
pub const META_COLUMN: &str = "meta";
/// Sibling presence map present in the root struct and every metadata struct.
pub const ISEMPTY_COLUMN: &str = "_isempty";

/// Distance column appended to vector-search results.
pub const DISTANCE_COLUMN: &str = "_distance";
/// Relevance column appended to full-text and reranked results.
pub const SCORE_COLUMN: &str = "score";

/// Application-level name of the vector column.
pub const EMBEDDING_FIELD: &str = "embedding";

/// Root columns in the order the root `_isempty` map lists them.
pub const ROOT_PRESENCE_COLUMNS: [&str; 6] = [
    BLOB_COLUMN,
    CONTENT_COLUMN,
    DATAFRAME_COLUMN,
    ID_COLUMN,
    META_COLUMN,
    VECTOR_COLUMN,
];
