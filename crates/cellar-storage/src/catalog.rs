use crate::encryption::UnitCipher;
use crate::locks::TableLocks;
use crate::table::TableStore;
use crate::unit::{TableUnit, UnitFiles};
use cellar_core::types::require_identifier;
use cellar_core::{normalize_table_name, CellarError, Clock, TableData, TableMetadata};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub data_dir: String,
    pub sync_writes: bool,
    pub encryption_key: Option<Vec<u8>>,
}

impl StoreOptions {
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            sync_writes: true,
            encryption_key: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct DropAllReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, CellarError)>,
}

impl DropAllReport {
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub(crate) struct StoreContext {
    pub(crate) files: UnitFiles,
    pub(crate) locks: TableLocks,
    /// Serialises create, drop and rename. Taken before any table lock.
    pub(crate) namespace: Mutex<()>,
    pub(crate) clock: Clock,
}

impl StoreContext {
    pub(crate) async fn load(&self, name: &str) -> Result<TableUnit, CellarError> {
        self.files
            .load(name)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| CellarError::TableNotFound(name.to_string()))
    }

    pub(crate) async fn store(&self, name: &str, unit: &TableUnit) -> Result<(), CellarError> {
        self.files.store(name, unit).await.map_err(storage_error)
    }
}

pub(crate) fn storage_error(err: anyhow::Error) -> CellarError {
    CellarError::Io(format!("{err:#}"))
}

#[derive(Debug, Clone)]
pub struct Catalog {
    ctx: Arc<StoreContext>,
}

impl Catalog {
    pub async fn open(options: StoreOptions) -> Result<Self, CellarError> {
        let cipher = match options.encryption_key.as_deref() {
            Some(key) => Some(UnitCipher::new(key).map_err(|e| {
                CellarError::InvalidArgument(e.to_string())
            })?),
            None => None,
        };
        tokio::fs::create_dir_all(&options.data_dir).await?;
        let files = UnitFiles::new(&options.data_dir, cipher, options.sync_writes);
        let swept = files.sweep_temp().await.map_err(storage_error)?;
        if swept > 0 {
            warn!("removed {swept} interrupted table writes in {}", options.data_dir);
        }
        info!(
            "catalog opened at {} (encrypted: {})",
            options.data_dir,
            options.encryption_key.is_some()
        );
        Ok(Self {
            ctx: Arc::new(StoreContext {
                files,
                locks: TableLocks::new(),
                namespace: Mutex::new(()),
                clock: Clock::new(),
            }),
        })
    }

    pub fn clock(&self) -> &Clock {
        &self.ctx.clock
    }

    /// Unknown and malformed names both report `false`.
    pub async fn exists(&self, name: &str) -> Result<bool, CellarError> {
        let Ok(name) = normalize_table_name(name) else {
            return Ok(false);
        };
        self.ctx.files.exists(&name).await.map_err(storage_error)
    }

    pub async fn create(
        &self,
        name: &str,
        column_families: &[String],
        max_versions: u32,
    ) -> Result<TableMetadata, CellarError> {
        let name = normalize_table_name(name)?;
        let families = normalize_families(column_families)?;
        if max_versions < 1 {
            return Err(CellarError::InvalidArgument(
                "max_versions must be at least 1".into(),
            ));
        }

        let _namespace = self.ctx.namespace.lock().await;
        let _guard = self.ctx.locks.write(&name).await;
        if self.ctx.files.exists(&name).await.map_err(storage_error)? {
            return Err(CellarError::AlreadyExists(format!("table {name}")));
        }
        let metadata =
            TableMetadata::new(name.clone(), families, max_versions, self.ctx.clock.now());
        let unit = TableUnit {
            metadata: metadata.clone(),
            data: TableData::new(),
        };
        self.ctx.store(&name, &unit).await?;
        info!(
            "created table {name} families={:?} max_versions={max_versions}",
            metadata.column_families
        );
        Ok(metadata)
    }

    pub async fn list(&self) -> Result<Vec<String>, CellarError> {
        self.ctx.files.list().await.map_err(storage_error)
    }

    pub async fn drop(&self, name: &str) -> Result<(), CellarError> {
        let name = lookup_name(name)?;
        let _namespace = self.ctx.namespace.lock().await;
        let guard = self.ctx.locks.write(&name).await;
        let unit = self.ctx.load(&name).await?;
        if unit.metadata.is_enabled() {
            return Err(CellarError::InvalidState(format!(
                "table {name} must be disabled before it can be dropped"
            )));
        }
        self.ctx.files.remove(&name).await.map_err(storage_error)?;
        drop(guard);
        self.ctx.locks.forget(&name).await;
        info!("dropped table {name} ({} rows)", unit.metadata.row_count);
        Ok(())
    }

    /// Attempts to drop every table; one failure never stops the rest.
    pub async fn drop_all(&self) -> Result<DropAllReport, CellarError> {
        let mut report = DropAllReport::default();
        for name in self.list().await? {
            match self.drop(&name).await {
                Ok(()) => report.succeeded.push(name),
                Err(err) => {
                    warn!("drop of {name} failed: {err}");
                    report.failed.push((name, err));
                }
            }
        }
        Ok(report)
    }

    pub async fn describe(&self, name: &str) -> Result<TableMetadata, CellarError> {
        self.table(name).await?.describe().await
    }

    #[cfg(test)]
    pub(crate) async fn tracked_locks(&self) -> usize {
        self.ctx.locks.len().await
    }

    pub async fn table(&self, name: &str) -> Result<TableStore, CellarError> {
        let name = lookup_name(name)?;
        if !self.ctx.files.exists(&name).await.map_err(storage_error)? {
            return Err(CellarError::TableNotFound(name));
        }
        Ok(TableStore::new(self.ctx.clone(), name))
    }
}

/// Like [`normalize_table_name`], but a name that could never have been
/// created is reported as missing.
pub(crate) fn lookup_name(raw: &str) -> Result<String, CellarError> {
    normalize_table_name(raw).map_err(|_| CellarError::TableNotFound(raw.to_string()))
}

fn normalize_families(column_families: &[String]) -> Result<Vec<String>, CellarError> {
    if column_families.is_empty() {
        return Err(CellarError::InvalidArgument(
            "at least one column family is required".into(),
        ));
    }
    let mut families: Vec<String> = Vec::with_capacity(column_families.len());
    for family in column_families {
        require_identifier("column family", family)?;
        let family = family.trim().to_string();
        if !families.contains(&family) {
            families.push(family);
        }
    }
    Ok(families)
}
