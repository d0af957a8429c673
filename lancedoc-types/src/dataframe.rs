//! Tabular document payloads.
//!
//! The store keeps tables as a single string column holding a canonical,
//! column-oriented JSON encoding:
//!
//! ```text
//! {"price":{"0":1.5,"1":2.0},"sku":{"0":"a","1":"b"}}
//! ```
//!
//! Columns are sorted by name and rows are keyed by their position, so equal
//! tables always encode to identical strings. The same encoding is used when a
//! table appears as a filter value.

use std::collections::BTreeMap;

use lancedoc_result::{Error, Result};
use serde_json::{Map, Value};

/// Column-oriented table of JSON scalars.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataFrame {
    columns: BTreeMap<String, Vec<Value>>,
    row_count: usize,
}

impl DataFrame {
    /// Build a table from named columns. All columns must have equal length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let mut out = BTreeMap::new();
        let mut row_count: Option<usize> = None;
        for (name, values) in columns {
            let name = name.into();
            match row_count {
                Some(expected) if expected != values.len() => {
                    return Err(Error::validation(format!(
                        "dataframe column '{name}' has {} rows, expected {expected}",
                        values.len()
                    )));
                }
                _ => row_count = Some(values.len()),
            }
            if out.insert(name.clone(), values).is_some() {
                return Err(Error::validation(format!(
                    "dataframe column '{name}' declared twice"
                )));
            }
        }
        Ok(Self {
            columns: out,
            row_count: row_count.unwrap_or(0),
        })
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Canonical string form stored in the `dataframe` column.
    pub fn to_canonical_json(&self) -> String {
        let mut root = Map::new();
        for (name, values) in &self.columns {
            let mut column = Map::new();
            for (idx, value) in values.iter().enumerate() {
                column.insert(idx.to_string(), value.clone());
            }
            root.insert(name.clone(), Value::Object(column));
        }
        Value::Object(root).to_string()
    }

    /// Parse the canonical string form.
    pub fn from_canonical_json(text: &str) -> Result<Self> {
        let parsed: Value = serde_json::from_str(text)?;
        let Value::Object(root) = parsed else {
            return Err(Error::validation(
                "dataframe payload must be a JSON object of columns",
            ));
        };

        let mut columns = Vec::with_capacity(root.len());
        for (name, column) in root {
            let Value::Object(cells) = column else {
                return Err(Error::validation(format!(
                    "dataframe column '{name}' must be an object keyed by row index"
                )));
            };
            let mut values = vec![Value::Null; cells.len()];
            let mut seen = vec![false; cells.len()];
            for (key, value) in cells {
                let idx: usize = key.parse().map_err(|_| {
                    Error::validation(format!(
                        "dataframe column '{name}' has non-numeric row key '{key}'"
                    ))
                })?;
                if idx >= values.len() || seen[idx] {
                    return Err(Error::validation(format!(
                        "dataframe column '{name}' has sparse or repeated row key '{key}'"
                    )));
                }
                seen[idx] = true;
                values[idx] = value;
            }
            columns.push((name, values));
        }
        Self::from_columns(columns)
    }
}
