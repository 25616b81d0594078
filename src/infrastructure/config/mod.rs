mod app_config;
pub mod loader;
pub mod paths;

pub use app_config::*;
pub use loader::ConfigSource;

use std::path::Path;
use std::sync::OnceLock;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Initialize configuration system (called at startup, before logging).
///
/// Returns where the config came from so the caller can report it once a
/// subscriber is installed. A repeated call keeps the first config.
pub fn init(path: Option<&Path>) -> (&'static AppConfig, ConfigSource) {
    let loaded = loader::load_app_config(path);
    let config = APP_CONFIG.get_or_init(|| loaded.config);
    (config, loaded.source)
}

