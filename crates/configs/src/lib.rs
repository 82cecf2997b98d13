//! Application configuration.
//!
//! `config.toml` (or the file named by `CONFIG_PATH`) is parsed once at
//! startup into an [`AppConfig`]; a few environment variables may override it.
//! [`ConfigService`] gives key-path access to the same document.

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

mod service;

pub use service::{ConfigError, ConfigService};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logger: LoggerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    /// Run pending migrations right after connecting.
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            auto_migrate: default_auto_migrate(),
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_auto_migrate() -> bool { true }

/// Which storage backend the application binds to at startup.
///
/// `"db"` selects the relational database; every other value, including a
/// missing key, selects the file-backed in-memory store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum StorageSource {
    Database,
    #[default]
    Memory,
}

impl From<&str> for StorageSource {
    fn from(value: &str) -> Self {
        match value.trim() {
            "db" => StorageSource::Database,
            _ => StorageSource::Memory,
        }
    }
}

impl From<String> for StorageSource {
    fn from(value: String) -> Self {
        StorageSource::from(value.as_str())
    }
}

impl StorageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageSource::Database => "db",
            StorageSource::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub source: StorageSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// ANSI colours on the console output.
    #[serde(default)]
    pub colors: bool,
    /// Also append to `info.log` and `errors.log` under `log_dir`.
    #[serde(default)]
    pub log_to_file: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            colors: false,
            log_to_file: false,
            log_dir: default_log_dir(),
        }
    }
}

fn default_log_level() -> String { "warn".into() }
fn default_log_dir() -> String { "logs".into() }

/// `1`, `true`, `yes` and `on` (any case) are true; anything else is false.
fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let service = ConfigService::load(path)?;
    Ok(service.app_config()?)
}

impl AppConfig {
    /// Load `config.toml`, apply environment overrides and validate.
    ///
    /// A missing file is not an error: defaults plus environment are used.
    pub fn load_and_validate() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let path = config_path();
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.apply_overrides(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Apply overrides looked up by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(source) = lookup("STORAGE_SOURCE") {
            self.storage.source = StorageSource::from(source);
        }
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logger.level = level;
        }
        if let Some(colors) = lookup("COLORS_ENABLED") {
            self.logger.colors = parse_flag(&colors);
        }
        if let Some(to_file) = lookup("LOG_TO_FILE") {
            self.logger.log_to_file = parse_flag(&to_file);
        }
        if self.database.url.trim().is_empty() {
            if let Some(url) = lookup("DATABASE_URL") {
                self.database.url = url;
            }
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.logger.normalize();
        if self.storage.source == StorageSource::Database {
            self.database.validate()?;
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl LoggerConfig {
    fn normalize(&mut self) {
        let level = self.level.trim().to_ascii_lowercase();
        self.level = if LOG_LEVELS.contains(&level.as_str()) { level } else { default_log_level() };
        if self.log_dir.trim().is_empty() {
            self.log_dir = default_log_dir();
        }
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}
