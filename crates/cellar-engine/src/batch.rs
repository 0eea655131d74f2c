use crate::cells::write_cell;
use cellar_core::types::require_identifier;
use cellar_core::{CellRecord, CellarError, InsertBatch, UpdateBatch};
use cellar_storage::TableStore;
use metrics::counter;
use std::time::Instant;
use tracing::info;

/// Bulk writes. Each batch is one read-modify-write of the table unit, so
/// a batch is persisted entirely or not at all.
#[derive(Debug, Clone)]
pub struct BatchExecutor {
    table: TableStore,
}

impl BatchExecutor {
    pub fn new(table: TableStore) -> Self {
        Self { table }
    }

    pub async fn insert_many(
        &self,
        family: &str,
        column: &str,
        values: &[String],
    ) -> Result<InsertBatch, CellarError> {
        counter!("cellar_insert_many").increment(1);
        if values.is_empty() {
            return Err(CellarError::InvalidArgument("empty batch".into()));
        }
        require_identifier("column family", family)?;
        require_identifier("column", column)?;
        let start = Instant::now();
        let generated_cells = self
            .table
            .mutate(|unit, clock| {
                let mut cells = Vec::with_capacity(values.len());
                for value in values {
                    let row_key = write_cell(unit, clock, None, family, column, value)?;
                    cells.push(CellRecord {
                        row_key,
                        column_family: family.to_string(),
                        column: column.to_string(),
                        value: value.clone(),
                    });
                }
                Ok(cells)
            })
            .await?;
        let elapsed = start.elapsed();
        info!(
            "inserted {} rows into {} in {elapsed:?}",
            generated_cells.len(),
            self.table.name()
        );
        Ok(InsertBatch {
            elapsed,
            count: generated_cells.len(),
            generated_cells,
        })
    }

    /// Appends a version to each addressed cell. Every record must name an
    /// existing row, family and column; the first record that does not
    /// fails the batch and none of its records are persisted.
    pub async fn update_many(&self, records: &[CellRecord]) -> Result<UpdateBatch, CellarError> {
        counter!("cellar_update_many").increment(1);
        if records.is_empty() {
            return Err(CellarError::InvalidArgument("empty batch".into()));
        }
        let start = Instant::now();
        self.table
            .mutate(|unit, clock| {
                let max_versions = unit.metadata.max_versions as usize;
                for (idx, record) in records.iter().enumerate() {
                    unit.data
                        .require_cell(&record.row_key, &record.column_family, &record.column)
                        .map_err(|err| at_record(idx, err))?;
                    unit.data.append(
                        &record.row_key,
                        &record.column_family,
                        &record.column,
                        &record.value,
                        clock.now(),
                        max_versions,
                    )?;
                }
                Ok(())
            })
            .await?;
        let elapsed = start.elapsed();
        info!(
            "updated {} cells in {} in {elapsed:?}",
            records.len(),
            self.table.name()
        );
        Ok(UpdateBatch {
            elapsed,
            count: records.len(),
            updated_cells: records.to_vec(),
        })
    }
}

fn at_record(idx: usize, err: CellarError) -> CellarError {
    match err {
        CellarError::RowNotFound(detail) => {
            CellarError::RowNotFound(format!("record {idx}: {detail}"))
        }
        CellarError::UnknownColumnFamily(detail) => {
            CellarError::UnknownColumnFamily(format!("record {idx}: {detail}"))
        }
        CellarError::UnknownColumn(detail) => {
            CellarError::UnknownColumn(format!("record {idx}: {detail}"))
        }
        other => other,
    }
}
