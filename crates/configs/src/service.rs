use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::AppConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config key not found: {0}")]
    Missing(String),
    #[error("config key {key} has unexpected shape: {source}")]
    Type { key: String, source: toml::de::Error },
}

/// Key-path reader over the raw configuration document.
///
/// Keys are dot separated (`storage.source`). Constructed once at startup and
/// passed to whatever needs it; there is no global instance.
#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    root: toml::Table,
}

impl ConfigService {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let root: toml::Table = toml::from_str(content)?;
        Ok(Self { root })
    }

    fn lookup(&self, key: &str) -> Option<&toml::Value> {
        let mut parts = key.split('.');
        let mut current = self.root.get(parts.next()?)?;
        for part in parts {
            current = current.as_table()?.get(part)?;
        }
        Some(current)
    }

    /// Whether the document has a value at `key`.
    pub fn has(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Deserialize the value at `key` into `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.lookup(key).ok_or_else(|| ConfigError::Missing(key.to_string()))?;
        value
            .clone()
            .try_into()
            .map_err(|source| ConfigError::Type { key: key.to_string(), source })
    }

    /// The whole document as the typed application config.
    pub fn app_config(&self) -> Result<AppConfig, ConfigError> {
        toml::Value::Table(self.root.clone())
            .try_into()
            .map_err(|source| ConfigError::Type { key: "<root>".to_string(), source })
    }
}
