//! Sibling presence maps.
//!
//! Every optional value is carried as a `(value, present)` pair while a struct
//! is being encoded. [`PresenceWriter`] collects those pairs and emits the
//! struct together with its `_isempty` member, which always comes first.

use lancedoc_result::{Error, Result};
use lancedoc_types::columns::ISEMPTY_COLUMN;
use lancedoc_types::{StorageValue, StructValue};

/// A physical value paired with its logical presence.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Slot {
    pub value: StorageValue,
    pub present: bool,
}

impl Slot {
    pub fn present(value: StorageValue) -> Self {
        Self {
            value,
            present: true,
        }
    }

    /// A placeholder standing in for an absent field.
    pub fn absent(placeholder: StorageValue) -> Self {
        Self {
            value: placeholder,
            present: false,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct PresenceWriter {
    values: Vec<(String, StorageValue)>,
    flags: Vec<(String, StorageValue)>,
}

impl PresenceWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            flags: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, name: &str, slot: Slot) {
        self.flags
            .push((name.to_string(), StorageValue::Boolean(!slot.present)));
        self.values.push((name.to_string(), slot.value));
    }

    pub fn finish(self) -> StructValue {
        let presence: StructValue = self.flags.into_iter().collect();
        std::iter::once((ISEMPTY_COLUMN.to_string(), StorageValue::Struct(presence)))
            .chain(self.values)
            .collect()
    }
}

/// Whether `name` is logically present in `value`.
///
/// A stored struct without a flag for a declared field does not conform to
/// the table schema and is rejected rather than guessed at.
pub(crate) fn is_present(value: &StructValue, name: &str, path: &str) -> Result<bool> {
    match value.is_flagged_empty(name) {
        Some(flagged) => Ok(!flagged),
        None => Err(Error::validation(format!(
            "stored struct '{path}' has no {ISEMPTY_COLUMN} flag for '{name}'"
        ))),
    }
}
