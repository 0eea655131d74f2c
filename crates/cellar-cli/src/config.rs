use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cellar_storage::StoreOptions;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub sync_writes: bool,
    pub encryption_enabled: bool,
    pub encryption_key_base64: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "cellar-data".into(),
            sync_writes: true,
            encryption_enabled: false,
            encryption_key_base64: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl Config {
    pub fn from_path(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("storage.data_dir must not be empty"));
        }
        if self.storage.encryption_enabled {
            let key = self.encryption_key()?;
            if key.map(|k| k.len()) != Some(32) {
                return Err(anyhow::anyhow!(
                    "storage encryption enabled but key is missing or not 32 bytes"
                ));
            }
        }
        self.log
            .level
            .parse::<tracing::Level>()
            .map_err(|_| anyhow::anyhow!("unknown log level {}", self.log.level))?;
        Ok(())
    }

    fn encryption_key(&self) -> anyhow::Result<Option<Vec<u8>>> {
        if !self.storage.encryption_enabled {
            return Ok(None);
        }
        match self.storage.encryption_key_base64.as_deref() {
            Some(encoded) => Ok(Some(STANDARD.decode(encoded.trim())?)),
            None => Ok(None),
        }
    }

    pub fn store_options(&self) -> anyhow::Result<StoreOptions> {
        Ok(StoreOptions {
            data_dir: self.storage.data_dir.clone(),
            sync_writes: self.storage.sync_writes,
            encryption_key: self.encryption_key()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").expect("parse");
        assert_eq!(config.storage.data_dir, "cellar-data");
        assert!(config.storage.sync_writes);
        assert_eq!(config.log.level, "info");
        let options = config.store_options().expect("options");
        assert!(options.encryption_key.is_none());
    }

    #[test]
    fn encryption_requires_a_32_byte_key() {
        let missing = "[storage]\nencryption_enabled = true\n";
        assert!(Config::from_toml(missing).is_err());

        // 16 zero bytes
        let short = "[storage]\nencryption_enabled = true\nencryption_key_base64 = \"AAAAAAAAAAAAAAAAAAAAAA==\"\n";
        assert!(Config::from_toml(short).is_err());

        let key = "A".repeat(43) + "=";
        let ok = format!(
            "[storage]\ndata_dir = \"/tmp/x\"\nencryption_enabled = true\nencryption_key_base64 = \"{key}\"\n"
        );
        let config = Config::from_toml(&ok).expect("parse");
        let options = config.store_options().expect("options");
        assert_eq!(options.encryption_key.map(|k| k.len()), Some(32));
        assert_eq!(options.data_dir, "/tmp/x");
    }

    #[test]
    fn rejects_unknown_log_level() {
        assert!(Config::from_toml("[log]\nlevel = \"loud\"\n").is_err());
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("cellar.toml");
        std::fs::write(&path, "[storage]\nsync_writes = false\n[log]\nlevel = \"debug\"\n")
            .expect("write");
        let config = Config::from_path(&path.to_string_lossy()).expect("load");
        assert!(!config.storage.sync_writes);
        assert_eq!(config.log.level, "debug");
    }
}
