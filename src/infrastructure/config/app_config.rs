use super::paths;
use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend: "sqlite" (default) or "mongodb"
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    pub sqlite: SqliteConfig,
    /// Only used when storage_type is mongodb
    pub mongodb: MongoDbConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    #[default]
    Sqlite,
    Mongodb,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SqliteConfig {
    /// Leave empty to use platform default path
    pub path: String,
}

impl SqliteConfig {
    pub fn effective_path(&self) -> PathBuf {
        if self.path.is_empty() {
            paths::default_sqlite_path()
        } else {
            PathBuf::from(&self.path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoDbConfig {
    pub uri: String,
    pub database: String,
    /// Connect and server selection timeout, e.g. "3s" or "500ms"
    pub connect_timeout: String,
}

impl MongoDbConfig {
    pub fn timeout(&self) -> Result<Duration, DomainError> {
        humantime::parse_duration(&self.connect_timeout).map_err(|e| {
            DomainError::Config(format!(
                "invalid mongodb.connect_timeout {:?}: {}",
                self.connect_timeout, e
            ))
        })
    }
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "santa".to_string(),
            connect_timeout: "3s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is unset
    pub level: String,
    /// Also write daily rotated log files to the platform log directory
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: false,
        }
    }
}
