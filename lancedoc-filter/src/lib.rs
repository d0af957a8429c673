//! Structured filter compiler.
//!
//! Turns a filter tree such as
//!
//! ```json
//! {"operator": "AND", "conditions": [
//!     {"field": "meta.count", "operator": "==", "value": 5},
//!     {"field": "meta.count", "operator": "!=", "value": null}
//! ]}
//! ```
//!
//! into a SQL predicate for the storage engine, reading absence from the
//! `_isempty` flags written by the document codec rather than from physical
//! nulls alone. Filters go through a typed [`Predicate`] which can also be
//! evaluated in memory against stored rows.

#![forbid(unsafe_code)]

pub mod compile;
pub mod node;
pub mod predicate;
pub mod quote;

pub use compile::{compile, compile_json, delete_predicate, lower};
pub use node::{Comparison, ComparisonOp, FilterNode, FilterValue, Logical, LogicalOp};
pub use predicate::{ColumnPath, CompareOp, Predicate, Scalar};
