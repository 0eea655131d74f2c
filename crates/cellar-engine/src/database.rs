use crate::batch::BatchExecutor;
use crate::cells::CellEngine;
use cellar_core::{
    CellRecord, CellarError, InsertBatch, RowView, ScanView, TableMetadata, TruncateReport,
    UpdateBatch,
};
use cellar_storage::{AlterTable, Catalog, DropAllReport, StoreOptions, TableStore};

/// Every table and cell operation, addressed by table name.
#[derive(Debug, Clone)]
pub struct Database {
    catalog: Catalog,
}

impl Database {
    pub async fn open(options: StoreOptions) -> Result<Self, CellarError> {
        Ok(Self::new(Catalog::open(options).await?))
    }

    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    async fn table(&self, name: &str) -> Result<TableStore, CellarError> {
        self.catalog.table(name).await
    }

    async fn cells(&self, name: &str) -> Result<CellEngine, CellarError> {
        Ok(CellEngine::new(self.table(name).await?))
    }

    pub async fn exists(&self, name: &str) -> Result<bool, CellarError> {
        self.catalog.exists(name).await
    }

    pub async fn create(
        &self,
        name: &str,
        column_families: &[String],
        max_versions: u32,
    ) -> Result<TableMetadata, CellarError> {
        self.catalog.create(name, column_families, max_versions).await
    }

    pub async fn list_tables(&self) -> Result<Vec<String>, CellarError> {
        self.catalog.list().await
    }

    pub async fn describe(&self, name: &str) -> Result<TableMetadata, CellarError> {
        self.catalog.describe(name).await
    }

    pub async fn drop_table(&self, name: &str) -> Result<(), CellarError> {
        self.catalog.drop(name).await
    }

    pub async fn drop_all(&self) -> Result<DropAllReport, CellarError> {
        self.catalog.drop_all().await
    }

    pub async fn enable(&self, name: &str) -> Result<(), CellarError> {
        self.table(name).await?.enable().await
    }

    pub async fn disable(&self, name: &str) -> Result<(), CellarError> {
        self.table(name).await?.disable().await
    }

    pub async fn is_enabled(&self, name: &str) -> Result<bool, CellarError> {
        self.table(name).await?.is_enabled().await
    }

    pub async fn alter(
        &self,
        name: &str,
        new_name: Option<&str>,
        add_column_family: Option<&str>,
    ) -> Result<TableMetadata, CellarError> {
        self.table(name)
            .await?
            .alter(AlterTable {
                new_name: new_name.map(str::to_string),
                add_column_family: add_column_family.map(str::to_string),
            })
            .await
    }

    pub async fn put(
        &self,
        table: &str,
        family: &str,
        column: &str,
        value: &str,
        row_key: Option<&str>,
    ) -> Result<String, CellarError> {
        self.cells(table)
            .await?
            .put(family, column, value, row_key)
            .await
    }

    pub async fn get(&self, table: &str, row_key: &str) -> Result<RowView, CellarError> {
        self.cells(table).await?.get(row_key).await
    }

    pub async fn scan(&self, table: &str) -> Result<ScanView, CellarError> {
        self.cells(table).await?.scan().await
    }

    pub async fn delete(
        &self,
        table: &str,
        row_key: &str,
        family: &str,
        column: &str,
    ) -> Result<(), CellarError> {
        self.cells(table)
            .await?
            .delete(row_key, family, column)
            .await
    }

    pub async fn delete_row(&self, table: &str, row_key: &str) -> Result<(), CellarError> {
        self.cells(table).await?.delete_row(row_key).await
    }

    pub async fn count(&self, table: &str) -> Result<u64, CellarError> {
        self.cells(table).await?.count().await
    }

    pub async fn truncate(&self, table: &str) -> Result<TruncateReport, CellarError> {
        self.cells(table).await?.truncate().await
    }

    pub async fn insert_many(
        &self,
        table: &str,
        family: &str,
        column: &str,
        values: &[String],
    ) -> Result<InsertBatch, CellarError> {
        BatchExecutor::new(self.table(table).await?)
            .insert_many(family, column, values)
            .await
    }

    pub async fn update_many(
        &self,
        table: &str,
        records: &[CellRecord],
    ) -> Result<UpdateBatch, CellarError> {
        BatchExecutor::new(self.table(table).await?)
            .update_many(records)
            .await
    }
}
