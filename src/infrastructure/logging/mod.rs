//! Logging infrastructure with optional file output.

use crate::infrastructure::config::{paths, LoggingConfig};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize logging with console and optional file output.
///
/// `RUST_LOG` takes precedence over the configured level. When file output
/// is enabled, logs are written to:
/// - macOS: ~/Library/Application Support/santa/logs/
/// - Windows: %APPDATA%\santa\logs\
/// - Linux: ~/.config/santa/logs/
pub fn setup(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // Console goes to stderr so command output on stdout stays machine-readable
    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    let file_layer = if config.file {
        let log_dir = paths::log_dir();

        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
            None
        } else {
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "santa.log");

            Some(
                fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(file_appender)
                    .with_filter(EnvFilter::new("info")),
            )
        }
    } else {
        None
    };

    match file_layer {
        Some(file_layer) => {
            tracing_subscriber::registry()
                .with(console_layer)
                .with(file_layer)
                .init();
            tracing::info!("File logging enabled: {:?}", paths::log_dir());
        }
        None => {
            tracing_subscriber::registry().with(console_layer).init();
        }
    }

    tracing::debug!("Logging initialized (level={})", config.level);
}
