use crate::error::CellarError;
use crate::types::{ColumnHistory, RowData, RowView, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Row key -> family -> column -> timestamp -> value. Rows only disappear
/// through [`TableData::remove_row`] or [`TableData::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableData {
    rows: BTreeMap<String, RowData>,
}

impl TableData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_row(&self, row_key: &str) -> bool {
        self.rows.contains_key(row_key)
    }

    pub fn row(&self, row_key: &str) -> Option<&RowData> {
        self.rows.get(row_key)
    }

    pub fn rows(&self) -> &BTreeMap<String, RowData> {
        &self.rows
    }

    pub fn into_rows(self) -> BTreeMap<String, RowData> {
        self.rows
    }

    pub fn insert_row(&mut self, row_key: &str) -> bool {
        if self.rows.contains_key(row_key) {
            return false;
        }
        self.rows.insert(row_key.to_string(), RowData::new());
        true
    }

    /// Stores at `now`, or one past the newest version if that is not older.
    /// Smallest timestamps are evicted beyond `max_versions`.
    pub fn append(
        &mut self,
        row_key: &str,
        family: &str,
        column: &str,
        value: &str,
        now: Timestamp,
        max_versions: usize,
    ) -> Result<Timestamp, CellarError> {
        let row = self
            .rows
            .get_mut(row_key)
            .ok_or_else(|| CellarError::RowNotFound(row_key.to_string()))?;
        let history = row
            .entry(family.to_string())
            .or_default()
            .entry(column.to_string())
            .or_default();
        let ts = match history.last_key_value() {
            Some((newest, _)) if *newest >= now => newest.next(),
            _ => now,
        };
        history.insert(ts, value.to_string());
        evict_oldest(history, max_versions.max(1));
        Ok(ts)
    }

    pub fn latest(&self, row_key: &str) -> Option<RowView> {
        let row = self.rows.get(row_key)?;
        let view = row
            .iter()
            .map(|(family, columns)| {
                let latest = columns
                    .iter()
                    .filter_map(|(column, history)| {
                        history
                            .last_key_value()
                            .map(|(_, value)| (column.clone(), value.clone()))
                    })
                    .collect();
                (family.clone(), latest)
            })
            .collect();
        Some(view)
    }

    /// Checks row, then family, then column.
    pub fn remove_cell(
        &mut self,
        row_key: &str,
        family: &str,
        column: &str,
    ) -> Result<usize, CellarError> {
        let row = self
            .rows
            .get_mut(row_key)
            .ok_or_else(|| CellarError::RowNotFound(row_key.to_string()))?;
        let columns = row.get_mut(family).ok_or_else(|| {
            CellarError::UnknownColumnFamily(format!("{family} in row {row_key}"))
        })?;
        let history = columns.remove(column).ok_or_else(|| {
            CellarError::UnknownColumn(format!("{family}:{column} in row {row_key}"))
        })?;
        if columns.is_empty() {
            row.remove(family);
        }
        Ok(history.len())
    }

    pub fn remove_row(&mut self, row_key: &str) -> Option<RowData> {
        self.rows.remove(row_key)
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.rows.len();
        self.rows.clear();
        removed
    }

    pub fn require_cell(
        &self,
        row_key: &str,
        family: &str,
        column: &str,
    ) -> Result<&ColumnHistory, CellarError> {
        let row = self
            .rows
            .get(row_key)
            .ok_or_else(|| CellarError::RowNotFound(row_key.to_string()))?;
        let columns = row.get(family).ok_or_else(|| {
            CellarError::UnknownColumnFamily(format!("{family} in row {row_key}"))
        })?;
        columns.get(column).ok_or_else(|| {
            CellarError::UnknownColumn(format!("{family}:{column} in row {row_key}"))
        })
    }
}

fn evict_oldest(history: &mut ColumnHistory, max_versions: usize) {
    while history.len() > max_versions {
        history.pop_first();
    }
}
