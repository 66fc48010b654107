//! File output handler for the diagnostics destination

use crate::logging::config::FileConfig;
use crate::logging::LoggingError;
use std::path::Path;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// File output handler. Lines are appended without ANSI escapes through a
/// non-blocking writer; the guard flushes pending lines when dropped.
pub struct FileOutput {
    writer: NonBlocking,
    guard: WorkerGuard,
    include_thread: bool,
}

impl FileOutput {
    /// Create the log file's parent directory and open the appender
    pub fn new(config: &FileConfig) -> Result<Self, LoggingError> {
        let path = config.path.as_path();
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(directory)?;

        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                LoggingError::Config(format!("Log file path has no file name: {}", path.display()))
            })?;

        let appender = rolling::RollingFileAppender::builder()
            .rotation(rolling::Rotation::NEVER)
            .filename_prefix(filename)
            .build(directory)
            .map_err(|e| LoggingError::Config(format!("Failed to open log file: {}", e)))?;
        let (writer, guard) = non_blocking(appender);

        Ok(Self {
            writer,
            guard,
            include_thread: config.include_thread,
        })
    }

    /// Create a tracing layer for file output.
    ///
    /// The returned guard must be held for as long as lines should reach the file.
    pub fn into_layer<S>(self) -> (impl Layer<S> + Send + Sync, WorkerGuard)
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_writer(self.writer)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(self.include_thread);
        (layer, self.guard)
    }
}
