use crate::error::CellarError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

pub const MAX_TABLE_NAME_LEN: usize = 128;

/// Microseconds since the UNIX epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub const fn as_micros(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type ColumnHistory = BTreeMap<Timestamp, String>;
pub type FamilyData = BTreeMap<String, ColumnHistory>;
pub type RowData = BTreeMap<String, FamilyData>;

pub type RowView = BTreeMap<String, BTreeMap<String, String>>;

pub type ScanView = BTreeMap<String, RowData>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub table_name: String,
    pub column_families: Vec<String>,
    pub table_id: Uuid,
    pub disabled: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub row_count: u64,
    pub max_versions: u32,
}

impl TableMetadata {
    pub fn new(
        table_name: String,
        column_families: Vec<String>,
        max_versions: u32,
        now: Timestamp,
    ) -> Self {
        Self {
            table_name,
            column_families,
            table_id: Uuid::new_v4(),
            disabled: false,
            created_at: now,
            updated_at: now,
            row_count: 0,
            max_versions,
        }
    }

    pub fn has_family(&self, family: &str) -> bool {
        self.column_families.iter().any(|f| f == family)
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub row_key: String,
    pub column_family: String,
    pub column: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateReport {
    pub rows_deleted: u64,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct InsertBatch {
    pub elapsed: Duration,
    pub count: usize,
    pub generated_cells: Vec<CellRecord>,
}

#[derive(Debug, Clone)]
pub struct UpdateBatch {
    pub elapsed: Duration,
    pub count: usize,
    pub updated_cells: Vec<CellRecord>,
}

/// The result doubles as a file stem.
pub fn normalize_table_name(raw: &str) -> Result<String, CellarError> {
    let name = raw.trim().replace(' ', "_");
    if name.is_empty() {
        return Err(CellarError::InvalidArgument(
            "table name must not be empty".into(),
        ));
    }
    if name.len() > MAX_TABLE_NAME_LEN {
        return Err(CellarError::InvalidArgument(format!(
            "table name longer than {MAX_TABLE_NAME_LEN} bytes"
        )));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(CellarError::InvalidArgument(format!(
            "table name {name:?} contains unsupported character {bad:?}"
        )));
    }
    Ok(name)
}

pub fn require_identifier(what: &str, value: &str) -> Result<(), CellarError> {
    if value.trim().is_empty() {
        return Err(CellarError::InvalidArgument(format!(
            "{what} must not be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_table_name, Timestamp};
    use crate::error::ErrorKind;

    #[test]
    fn table_names_are_normalized() {
        assert_eq!(normalize_table_name("  web users ").unwrap(), "web_users");
        assert_eq!(normalize_table_name("metrics-2024").unwrap(), "metrics-2024");
    }

    #[test]
    fn table_names_reject_path_like_input() {
        for raw in ["", "   ", "../etc", "a/b", "t.tbl"] {
            let err = normalize_table_name(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{raw:?}");
        }
        assert!(normalize_table_name(&"x".repeat(129)).is_err());
    }

    #[test]
    fn timestamps_order_numerically() {
        let a = Timestamp::from_micros(9);
        let b = Timestamp::from_micros(10);
        assert!(a < b);
        assert_eq!(a.next(), b);
    }
}
