//! Console output handler with color support

use crate::logging::config::ConsoleConfig;
use std::io;
use tracing::Subscriber;
use tracing_subscriber::fmt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Console output handler that writes human-readable lines to stdout
pub struct ConsoleOutput {
    config: ConsoleConfig,
}

impl ConsoleOutput {
    /// Create a new console output handler
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Create a tracing layer for console output
    pub fn create_layer<S>(&self) -> impl Layer<S> + Send + Sync
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(self.config.colors)
            .with_target(self.config.include_module)
    }
}
