use cellar_core::types::require_identifier;
use cellar_core::{CellarError, Clock, RowView, ScanView, TableData, TruncateReport};
use cellar_storage::{TableStore, TableUnit};
use metrics::counter;
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CellEngine {
    table: TableStore,
}

impl CellEngine {
    pub fn new(table: TableStore) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &TableStore {
        &self.table
    }

    /// A blank or missing row key appends a new row; an explicit key must exist.
    pub async fn put(
        &self,
        family: &str,
        column: &str,
        value: &str,
        row_key: Option<&str>,
    ) -> Result<String, CellarError> {
        counter!("cellar_put").increment(1);
        require_identifier("column family", family)?;
        require_identifier("column", column)?;
        let row_key = row_key.map(str::trim).filter(|k| !k.is_empty());
        self.table
            .mutate(|unit, clock| write_cell(unit, clock, row_key, family, column, value))
            .await
    }

    pub async fn get(&self, row_key: &str) -> Result<RowView, CellarError> {
        counter!("cellar_get").increment(1);
        self.table
            .read(|unit| {
                unit.data
                    .latest(row_key)
                    .ok_or_else(|| CellarError::RowNotFound(row_key.to_string()))
            })
            .await
    }

    pub async fn scan(&self) -> Result<ScanView, CellarError> {
        counter!("cellar_scan").increment(1);
        self.table.read(|unit| Ok(unit.data.rows().clone())).await
    }

    pub async fn delete(
        &self,
        row_key: &str,
        family: &str,
        column: &str,
    ) -> Result<(), CellarError> {
        counter!("cellar_delete").increment(1);
        self.table
            .mutate(|unit, _| unit.data.remove_cell(row_key, family, column).map(|_| ()))
            .await
    }

    pub async fn delete_row(&self, row_key: &str) -> Result<(), CellarError> {
        counter!("cellar_delete_row").increment(1);
        self.table
            .mutate(|unit, _| {
                unit.data
                    .remove_row(row_key)
                    .ok_or_else(|| CellarError::RowNotFound(row_key.to_string()))?;
                unit.metadata.row_count = unit.metadata.row_count.saturating_sub(1);
                Ok(())
            })
            .await
    }

    /// Tracked row count; not a recount.
    pub async fn count(&self) -> Result<u64, CellarError> {
        self.table.read(|unit| Ok(unit.metadata.row_count)).await
    }

    /// Disable, clear and re-enable folded into one durable write. Works on
    /// a disabled table too; the table is always left enabled.
    pub async fn truncate(&self) -> Result<TruncateReport, CellarError> {
        counter!("cellar_truncate").increment(1);
        let start = Instant::now();
        let rows_deleted = self
            .table
            .mutate_ungated(|unit, _| {
                let rows_deleted = unit.metadata.row_count;
                unit.data.clear();
                unit.metadata.row_count = 0;
                unit.metadata.disabled = false;
                Ok(rows_deleted)
            })
            .await?;
        let elapsed = start.elapsed();
        info!(
            "truncated table {} ({rows_deleted} rows, {elapsed:?})",
            self.table.name()
        );
        Ok(TruncateReport {
            rows_deleted,
            elapsed,
        })
    }
}

/// Shared by `put` and `insert_many`: explicit keys must exist, absent keys
/// allocate a fresh row. The row check precedes the family check.
pub(crate) fn write_cell(
    unit: &mut TableUnit,
    clock: &Clock,
    row_key: Option<&str>,
    family: &str,
    column: &str,
    value: &str,
) -> Result<String, CellarError> {
    let row_key = match row_key {
        Some(key) if !unit.data.contains_row(key) => {
            return Err(CellarError::RowNotFound(key.to_string()))
        }
        Some(key) => key.to_string(),
        None => fresh_row_key(&unit.data),
    };
    if !unit.metadata.has_family(family) {
        return Err(CellarError::UnknownColumnFamily(format!(
            "{family} is not declared on table {}",
            unit.metadata.table_name
        )));
    }
    if unit.data.insert_row(&row_key) {
        unit.metadata.row_count += 1;
    }
    let max_versions = unit.metadata.max_versions as usize;
    unit.data
        .append(&row_key, family, column, value, clock.now(), max_versions)?;
    Ok(row_key)
}

fn fresh_row_key(data: &TableData) -> String {
    loop {
        let key = Uuid::new_v4().simple().to_string();
        if !data.contains_row(&key) {
            return key;
        }
    }
}
