//! Error types and result definitions for the lancedoc workspace.
//!
//! Every crate in the workspace returns [`Result<T>`], whose error variant is
//! the single [`Error`] enum defined here. Errors propagate upward with `?`
//! and are never retried internally: each variant describes a failure the
//! caller must surface.
//!
//! # Error Categories
//!
//! - **Configuration errors** ([`Error::Configuration`]): a schema cannot be
//!   built because the store description is missing inputs or is invalid.
//! - **Validation errors** ([`Error::Validation`]): a document or row does not
//!   fit the table schema (embedding width, value types, empty ids).
//! - **Filter errors** ([`Error::Filter`]): a filter tree is structurally
//!   invalid or ill-typed for its operator.
//! - **Duplicate errors** ([`Error::Duplicate`]): a fail-on-duplicate write
//!   policy met an existing key.
//! - **Data format errors** ([`Error::Arrow`], [`Error::Json`]): Arrow batch
//!   assembly or JSON (de)serialization failed.
//! - **Internal errors** ([`Error::Internal`]): violated invariants.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
