use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use super::app_config::AppConfig;
use super::paths::config_dir;

/// Load a YAML configuration file from disk
pub fn load_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)?;
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Parse YAML from string
pub fn parse_yaml<T: DeserializeOwned>(content: &str) -> anyhow::Result<T> {
    let config: T = serde_yaml::from_str(content)?;
    Ok(config)
}

/// Where the loaded configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file at the path, defaults used
    Missing(PathBuf),
    /// The file could not be read or parsed, defaults used
    Invalid { path: PathBuf, error: String },
}

impl ConfigSource {
    /// Report the outcome. Call once a subscriber is installed, since
    /// loading happens before logging is set up.
    pub fn log(&self) {
        match self {
            Self::File(path) => tracing::info!("Loaded config from {:?}", path),
            Self::Missing(path) => tracing::debug!("No config found at {:?}, using defaults", path),
            Self::Invalid { path, error } => {
                tracing::warn!("Failed to parse {:?}: {}, using defaults", path, error)
            }
        }
    }
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub source: ConfigSource,
}

/// Load the application config.
///
/// Reads `path` if given, otherwise `config.yaml` in the user config
/// directory. Falls back to defaults if the file is missing or invalid.
pub fn load_app_config(path: Option<&Path>) -> LoadedConfig {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config_dir().join("config.yaml"));

    if !config_path.exists() {
        return LoadedConfig {
            config: AppConfig::default(),
            source: ConfigSource::Missing(config_path),
        };
    }

    match load_yaml::<AppConfig>(&config_path) {
        Ok(config) => LoadedConfig {
            config,
            source: ConfigSource::File(config_path),
        },
        Err(e) => LoadedConfig {
            config: AppConfig::default(),
            source: ConfigSource::Invalid {
                path: config_path,
                error: e.to_string(),
            },
        },
    }
}
