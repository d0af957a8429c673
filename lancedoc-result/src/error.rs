use std::fmt;
use thiserror::Error;

/// Unified error type for all lancedoc operations.
///
/// The codec and the filter compiler are pure transforms, so every variant
/// describes bad input or a bad store description rather than an I/O fault.
/// None of them are retryable: the caller has to change the input.
///
/// `Error` is `Send + Sync` so it can cross thread boundaries together with
/// the (immutable) schemas the components share.
#[derive(Error, Debug)]
pub enum Error {
    /// The store description cannot produce a table schema.
    ///
    /// Raised when a schema must be created but the metadata schema or the
    /// embedding width is missing, when the embedding width is not positive,
    /// or when the metadata schema itself is malformed (duplicate names,
    /// reserved names, unsupported types).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A document or row does not conform to the table schema.
    ///
    /// Typical causes:
    /// - an explicit embedding whose length differs from the schema width
    /// - a metadata value whose type cannot be stored in the declared column
    /// - an unparsable ISO-8601 string for a timestamp column
    /// - an empty document id
    #[error("validation error: {0}")]
    Validation(String),

    /// A filter tree is structurally invalid or ill-typed.
    ///
    /// Missing keys, unknown operators, wrong value types for an operator and
    /// unparsable date strings all end up here. Compilation never returns a
    /// partial predicate.
    #[error("filter error: {0}")]
    Filter(String),

    /// A fail-on-duplicate write policy met a pre-existing document id.
    #[error("duplicate document: {0}")]
    Duplicate(String),

    /// Arrow library error while assembling or reading record batches.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// JSON error while (de)serializing store descriptions, filters or
    /// tabular payloads.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error indicating a violated invariant.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error from any displayable value.
    ///
    /// ```
    /// use lancedoc_result::Error;
    ///
    /// let err = Error::configuration("embedding_dims must be positive");
    /// assert!(matches!(err, Error::Configuration(msg) if msg.contains("positive")));
    /// ```
    #[inline]
    pub fn configuration<E: fmt::Display>(err: E) -> Self {
        Error::Configuration(err.to_string())
    }

    /// Create a validation error from any displayable value.
    #[inline]
    pub fn validation<E: fmt::Display>(err: E) -> Self {
        Error::Validation(err.to_string())
    }

    /// Create a filter error from any displayable value.
    ///
    /// ```
    /// use lancedoc_result::Error;
    ///
    /// fn unknown_operator(op: &str) -> Result<(), Error> {
    ///     Err(Error::filter(format!("unknown comparison operator '{op}'")))
    /// }
    ///
    /// let err = unknown_operator("~=").unwrap_err();
    /// assert!(matches!(err, Error::Filter(msg) if msg.contains("~=")));
    /// ```
    #[inline]
    pub fn filter<E: fmt::Display>(err: E) -> Self {
        Error::Filter(err.to_string())
    }

    /// Whether the error was caused by the caller's input rather than the
    /// store description or an internal fault.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::Filter(_) | Error::Duplicate(_)
        )
    }
}
