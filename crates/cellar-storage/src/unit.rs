use crate::encryption::UnitCipher;
use anyhow::{anyhow, Context, Result};
use cellar_core::{TableData, TableMetadata};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

pub const UNIT_MAGIC: &[u8; 4] = b"CLR1";
pub const UNIT_EXTENSION: &str = "tbl";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableUnit {
    pub metadata: TableMetadata,
    pub data: TableData,
}

/// Every store goes through a sibling temp file that is renamed over the
/// live file, so a concurrent load sees either the old or the new unit.
#[derive(Debug, Clone)]
pub struct UnitFiles {
    root: PathBuf,
    cipher: Option<UnitCipher>,
    sync_writes: bool,
}

impl UnitFiles {
    pub fn new(root: impl Into<PathBuf>, cipher: Option<UnitCipher>, sync_writes: bool) -> Self {
        Self {
            root: root.into(),
            cipher,
            sync_writes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{UNIT_EXTENSION}"))
    }

    fn temp_path_for(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{name}.{UNIT_EXTENSION}{TEMP_SUFFIX}"))
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        Ok(fs::try_exists(self.path_for(name)).await?)
    }

    /// Reads a unit, or `None` when no file exists for `name`. The file name
    /// is authoritative for the table name.
    pub async fn load(&self, name: &str) -> Result<Option<TableUnit>> {
        let path = self.path_for(name);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| format!("reading {}", path.display()))
            }
        };
        let mut unit = self
            .decode(&bytes)
            .with_context(|| format!("decoding {}", path.display()))?;
        unit.metadata.table_name = name.to_string();
        Ok(Some(unit))
    }

    pub async fn store(&self, name: &str, unit: &TableUnit) -> Result<()> {
        metrics::counter!("cellar_unit_write").increment(1);
        let bytes = self.encode(unit)?;
        let tmp = self.temp_path_for(name);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp)
            .await
            .with_context(|| format!("creating {}", tmp.display()))?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        if self.sync_writes {
            file.sync_all().await?;
        }
        drop(file);
        fs::rename(&tmp, self.path_for(name)).await?;
        if self.sync_writes {
            self.sync_root().await;
        }
        Ok(())
    }

    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let target = self.path_for(to);
        if fs::try_exists(&target).await? {
            return Err(anyhow!("{} already exists", target.display()));
        }
        fs::rename(self.path_for(from), &target).await?;
        if self.sync_writes {
            self.sync_root().await;
        }
        Ok(())
    }

    pub async fn remove(&self, name: &str) -> Result<()> {
        fs::remove_file(self.path_for(name)).await?;
        if self.sync_writes {
            self.sync_root().await;
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(stem) = file_name.strip_suffix(&format!(".{UNIT_EXTENSION}")) {
                names.push(stem.to_string());
            }
        }
        Ok(names)
    }

    pub async fn sweep_temp(&self) -> Result<usize> {
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let is_temp = entry
                .file_name()
                .to_str()
                .map(|n| n.ends_with(&format!(".{UNIT_EXTENSION}{TEMP_SUFFIX}")))
                .unwrap_or(false);
            if is_temp {
                fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn encode(&self, unit: &TableUnit) -> Result<Vec<u8>> {
        let payload = bincode::serialize(unit)?;
        let payload = match &self.cipher {
            Some(cipher) => cipher.seal(&payload)?,
            None => payload,
        };
        let mut out = Vec::with_capacity(UNIT_MAGIC.len() + payload.len());
        out.extend_from_slice(UNIT_MAGIC);
        out.extend_from_slice(&payload);
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> Result<TableUnit> {
        let payload = bytes
            .strip_prefix(UNIT_MAGIC.as_slice())
            .ok_or_else(|| anyhow!("not a table unit (bad magic)"))?;
        let unit = match &self.cipher {
            Some(cipher) => bincode::deserialize(&cipher.open(payload)?)?,
            None => bincode::deserialize(payload)?,
        };
        Ok(unit)
    }

    async fn sync_root(&self) {
        let synced = match fs::File::open(&self.root).await {
            Ok(dir) => dir.sync_all().await,
            Err(err) => Err(err),
        };
        if let Err(err) = synced {
            warn!("directory sync of {} failed: {err}", self.root.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UnitFiles;
    use tempfile::TempDir;

    #[tokio::test]
    async fn failed_directory_sync_does_not_fail_caller() {
        let dir = TempDir::new().expect("tempdir");
        let files = UnitFiles::new(dir.path().join("gone"), None, true);
        files.sync_root().await;
        assert!(!files.root().exists());
    }
}
