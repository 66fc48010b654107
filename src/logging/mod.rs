//! # Logging
//!
//! Process-wide log output (console plus the diagnostics file) and the per-run
//! [`Diagnostics`] sink handed to pipeline components.
//!
//! Library code logs through the `log` facade; [`LoggingSystem::init`] installs a
//! `tracing-subscriber` registry that also receives `log` records.

pub mod config;
pub mod diagnostics;
pub mod features;
pub mod outputs;

pub use config::{LogConfig, DEFAULT_LOG_FILE};
pub use diagnostics::{DiagnosticEvent, Diagnostics, DiagnosticsSummary, Severity};
pub use features::LogFeature;

use outputs::{ConsoleOutput, FileOutput};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the file writer alive. Dropping it flushes buffered lines.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Installs the process logger
pub struct LoggingSystem;

impl LoggingSystem {
    /// Initialize logging with the given configuration.
    ///
    /// `RUST_LOG`, when set, takes precedence over the configured levels.
    pub fn init(config: &LogConfig) -> Result<LoggingGuard, LoggingError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(config.filter_directives()?)
                .map_err(|e| LoggingError::Config(format!("Invalid filter: {}", e)))?,
        };

        let console = config
            .console
            .enabled
            .then(|| ConsoleOutput::new(&config.console).create_layer());

        let (file, file_guard) = if config.file.enabled {
            let (layer, guard) = FileOutput::new(&config.file)?.into_layer();
            (Some(layer), Some(guard))
        } else {
            (None, None)
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(file)
            .try_init()
            .map_err(|_| LoggingError::AlreadyInitialized)?;

        Ok(LoggingGuard {
            _file_guard: file_guard,
        })
    }
}

/// Logging system errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logging system already initialized")]
    AlreadyInitialized,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Config error: {0}")]
    ConfigError(#[from] config::ConfigError),
}
