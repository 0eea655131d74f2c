use crate::catalog::{storage_error, StoreContext};
use crate::unit::TableUnit;
use cellar_core::types::require_identifier;
use cellar_core::{normalize_table_name, CellarError, Clock, TableMetadata};
use std::sync::Arc;
use tracing::{debug, info};

/// Requested schema change. Either field may be set, but not neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlterTable {
    pub new_name: Option<String>,
    pub add_column_family: Option<String>,
}

/// Handle on one table. Owns the lifecycle gate: every data mutation goes
/// through [`TableStore::mutate`], which refuses disabled tables.
#[derive(Debug, Clone)]
pub struct TableStore {
    ctx: Arc<StoreContext>,
    name: String,
}

impl TableStore {
    pub(crate) fn new(ctx: Arc<StoreContext>, name: String) -> Self {
        Self { ctx, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn describe(&self) -> Result<TableMetadata, CellarError> {
        self.read(|unit| Ok(unit.metadata.clone())).await
    }

    pub async fn is_enabled(&self) -> Result<bool, CellarError> {
        self.read(|unit| Ok(unit.metadata.is_enabled())).await
    }

    pub async fn enable(&self) -> Result<(), CellarError> {
        self.set_disabled(false).await
    }

    pub async fn disable(&self) -> Result<(), CellarError> {
        self.set_disabled(true).await
    }

    /// Idempotent; `updated_at` moves even when the state is unchanged.
    async fn set_disabled(&self, disabled: bool) -> Result<(), CellarError> {
        let _guard = self.ctx.locks.write(&self.name).await;
        let mut unit = self.ctx.load(&self.name).await?;
        unit.metadata.disabled = disabled;
        unit.metadata.updated_at = self.ctx.clock.now();
        self.ctx.store(&self.name, &unit).await?;
        info!(
            "table {} {}",
            self.name,
            if disabled { "disabled" } else { "enabled" }
        );
        Ok(())
    }

    /// Renames the table and/or declares a new column family. The table
    /// must be disabled. On a successful rename this handle follows the
    /// new name.
    pub async fn alter(&mut self, change: AlterTable) -> Result<TableMetadata, CellarError> {
        if change.new_name.is_none() && change.add_column_family.is_none() {
            return Err(CellarError::InvalidArgument(
                "alter needs a new name, a new column family, or both".into(),
            ));
        }
        let new_name = change
            .new_name
            .as_deref()
            .map(normalize_table_name)
            .transpose()?;
        let new_family = match change.add_column_family.as_deref() {
            Some(family) => {
                require_identifier("column family", family)?;
                Some(family.trim().to_string())
            }
            None => None,
        };

        let _namespace = self.ctx.namespace.lock().await;
        let guard = self.ctx.locks.write(&self.name).await;
        let mut unit = self.ctx.load(&self.name).await?;
        if unit.metadata.is_enabled() {
            return Err(CellarError::InvalidState(format!(
                "table {} must be disabled before it can be altered",
                self.name
            )));
        }
        let rename_to = new_name.filter(|n| *n != self.name);
        if let Some(target) = &rename_to {
            if self.ctx.files.exists(target).await.map_err(storage_error)? {
                return Err(CellarError::AlreadyExists(format!("table {target}")));
            }
        }
        if let Some(family) = new_family {
            if unit.metadata.has_family(&family) {
                return Err(CellarError::AlreadyExists(format!(
                    "column family {family} in table {}",
                    self.name
                )));
            }
            info!("table {}: adding column family {family}", self.name);
            unit.metadata.column_families.push(family);
        }
        unit.metadata.updated_at = self.ctx.clock.now();

        match rename_to {
            Some(target) => {
                // Content first, then the rename; each step is atomic on its own.
                unit.metadata.table_name = target.clone();
                self.ctx.store(&self.name, &unit).await?;
                self.ctx
                    .files
                    .rename(&self.name, &target)
                    .await
                    .map_err(storage_error)?;
                info!("table {} renamed to {target}", self.name);
                drop(guard);
                self.ctx.locks.forget(&self.name).await;
                self.name = target;
            }
            None => self.ctx.store(&self.name, &unit).await?,
        }
        Ok(unit.metadata)
    }

    pub async fn read<T>(
        &self,
        f: impl FnOnce(&TableUnit) -> Result<T, CellarError>,
    ) -> Result<T, CellarError> {
        let _guard = self.ctx.locks.read(&self.name).await;
        let unit = self.ctx.load(&self.name).await?;
        f(&unit)
    }

    /// Read-modify-write of the whole table unit under the table's write
    /// lock. Fails with `TableDisabled` on a disabled table. Nothing is
    /// written when `f` returns an error.
    pub async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut TableUnit, &Clock) -> Result<T, CellarError>,
    ) -> Result<T, CellarError> {
        self.write_unit(true, f).await
    }

    /// Same as [`TableStore::mutate`] but also accepted on a disabled table.
    /// Reserved for lifecycle rewrites that set the enabled flag themselves.
    pub async fn mutate_ungated<T>(
        &self,
        f: impl FnOnce(&mut TableUnit, &Clock) -> Result<T, CellarError>,
    ) -> Result<T, CellarError> {
        self.write_unit(false, f).await
    }

    async fn write_unit<T>(
        &self,
        gated: bool,
        f: impl FnOnce(&mut TableUnit, &Clock) -> Result<T, CellarError>,
    ) -> Result<T, CellarError> {
        let _guard = self.ctx.locks.write(&self.name).await;
        let mut unit = self.ctx.load(&self.name).await?;
        if gated && !unit.metadata.is_enabled() {
            return Err(CellarError::TableDisabled(self.name.clone()));
        }
        let out = f(&mut unit, &self.ctx.clock)?;
        unit.metadata.updated_at = self.ctx.clock.now();
        self.ctx.store(&self.name, &unit).await?;
        debug!(
            "table {} written ({} rows)",
            self.name, unit.metadata.row_count
        );
        Ok(out)
    }
}
