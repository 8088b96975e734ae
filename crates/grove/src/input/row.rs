//! Raw rows as handed over by the upstream tokenizer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Normalize a header cell: trim, lower-case, collapse whitespace runs to `_`.
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// One tokenized row, keyed by normalized column name.
///
/// Rows are never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    cells: IndexMap<String, String>,
}

impl RawRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from a header line and one line of values.
    ///
    /// Headers are normalized. Missing trailing cells become empty strings and
    /// surplus cells are ignored.
    pub fn from_pairs<H, V>(headers: &[H], values: &[V]) -> Self
    where
        H: AsRef<str>,
        V: AsRef<str>,
    {
        let cells = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let value = values.get(i).map(|v| v.as_ref()).unwrap_or("");
                (normalize_header(h.as_ref()), value.to_string())
            })
            .collect();
        Self { cells }
    }

    /// Set a cell, normalizing the column name.
    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.cells.insert(normalize_header(column), value.into());
        self
    }

    /// Get a trimmed, non-empty value for a column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Get the untouched cell value.
    pub fn raw(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(|v| v.as_str())
    }

    /// Whether every cell is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| v.trim().is_empty())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let cells = iter
            .into_iter()
            .map(|(k, v)| (normalize_header(k.as_ref()), v.into()))
            .collect();
        Self { cells }
    }
}
