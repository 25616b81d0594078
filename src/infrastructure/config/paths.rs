use std::path::PathBuf;

/// Get platform-specific configuration directory
pub fn config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Library/Application Support/santa")
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("santa")
    }
}

pub fn default_sqlite_path() -> PathBuf {
    config_dir().join("data.db")
}

pub fn log_dir() -> PathBuf {
    config_dir().join("logs")
}
