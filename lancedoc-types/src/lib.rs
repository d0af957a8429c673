//! Value types shared across the lancedoc crates.
//!
//! Two representations of the same record live here:
//!
//! - [`Document`] and [`MetaValue`]: the application-level view, where any
//!   optional field may simply be missing.
//! - [`StorageValue`] and [`StructValue`]: the physical view written to the
//!   columnar store, where every declared field holds a value and absence is
//!   recorded in sibling `_isempty` maps.
//!
//! The codec crate converts between the two; the filter crate evaluates
//! predicates against the physical view.

pub mod columns;
pub mod dataframe;
pub mod document;
pub mod timestamp;
pub mod value;

pub use dataframe::DataFrame;
pub use document::{Document, MetaValue, Metadata};
pub use value::{StorageRow, StorageValue, StructValue};
