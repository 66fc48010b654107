//! Configuration management for the logging system
//!
//! Logging configuration is loaded from defaults, an optional TOML file and
//! environment variable overrides, in that order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default diagnostics destination, relative to the working directory
pub const DEFAULT_LOG_FILE: &str = "movie_loader_errors.log";

/// Main logging configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default log level for all targets
    pub level: String,
    /// Console output configuration
    pub console: ConsoleConfig,
    /// File output configuration
    pub file: FileConfig,
    /// Per-feature level overrides, keyed by feature name (`writer`, `cleaner`, ...)
    pub features: HashMap<String, String>,
}

/// Console output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Enable console output
    pub enabled: bool,
    /// Enable colors in console output
    pub colors: bool,
    /// Include module path
    pub include_module: bool,
}

/// File output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Enable file output
    pub enabled: bool,
    /// Log file path
    pub path: PathBuf,
    /// Include thread information
    pub include_thread: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
            features: HashMap::new(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colors: true,
            include_module: true,
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(DEFAULT_LOG_FILE),
            include_thread: false,
        }
    }
}

impl LogConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;

        let mut config: LogConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(level) = std::env::var("MOVIEGRAPH_LOG_LEVEL") {
            self.level = level;
        }
        if let Ok(colors) = std::env::var("MOVIEGRAPH_LOG_COLORS") {
            self.console.colors = colors.parse().unwrap_or(true);
        }
        if let Ok(enabled) = std::env::var("MOVIEGRAPH_LOG_CONSOLE_ENABLED") {
            self.console.enabled = enabled.parse().unwrap_or(true);
        }
        if let Ok(path) = std::env::var("MOVIEGRAPH_LOG_FILE") {
            self.file.path = PathBuf::from(path);
        }
        if let Ok(enabled) = std::env::var("MOVIEGRAPH_LOG_FILE_ENABLED") {
            self.file.enabled = enabled.parse().unwrap_or(true);
        }

        for (key, value) in std::env::vars() {
            if let Some(feature) = key.strip_prefix("MOVIEGRAPH_LOG_FEATURE_") {
                self.features.insert(feature.to_lowercase(), value);
            }
        }

        self.validate()
    }

    /// Set the diagnostics destination
    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file.path = path.into();
        self.file.enabled = true;
        self
    }

    /// Check that every configured level is recognised
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_level(&self.level)?;
        for level in self.features.values() {
            parse_level(level)?;
        }
        Ok(())
    }

    /// Render the configuration as an `EnvFilter` directive string.
    ///
    /// Feature overrides become `moviegraph::<feature>=<level>` directives.
    pub fn filter_directives(&self) -> Result<String, ConfigError> {
        let mut directives = vec![parse_level(&self.level)?.to_string()];
        let mut features: Vec<_> = self.features.iter().collect();
        features.sort();
        for (feature, level) in features {
            directives.push(format!("moviegraph::{}={}", feature, parse_level(level)?));
        }
        Ok(directives.join(","))
    }
}

/// Parse a level name, case-insensitively
pub fn parse_level(level: &str) -> Result<tracing::Level, ConfigError> {
    match level.to_uppercase().as_str() {
        "TRACE" => Ok(tracing::Level::TRACE),
        "DEBUG" => Ok(tracing::Level::DEBUG),
        "INFO" => Ok(tracing::Level::INFO),
        "WARN" | "WARNING" => Ok(tracing::Level::WARN),
        "ERROR" => Ok(tracing::Level::ERROR),
        _ => Err(ConfigError::InvalidLevel(level.to_string())),
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_logs_info_to_console_and_file() {
        let config = LogConfig::default();
        assert_eq!(config.level, "INFO");
        assert!(config.console.enabled);
        assert!(config.file.enabled);
        assert_eq!(config.file.path, PathBuf::from(DEFAULT_LOG_FILE));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn filter_directives_include_feature_overrides() {
        let mut config = LogConfig::default();
        config.features.insert("writer".to_string(), "debug".to_string());
        config.features.insert("cleaner".to_string(), "ERROR".to_string());
        assert_eq!(
            config.filter_directives().unwrap(),
            "INFO,moviegraph::cleaner=ERROR,moviegraph::writer=DEBUG"
        );
    }

    #[test]
    fn invalid_level_is_rejected() {
        let config = LogConfig {
            level: "LOUD".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLevel(_))));
    }

    #[test]
    fn loads_partial_toml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logging.toml");
        std::fs::write(
            &path,
            "level = \"DEBUG\"\n[file]\npath = \"custom.log\"\n",
        )
        .unwrap();

        let config = LogConfig::from_file(&path).unwrap();
        assert_eq!(config.file.path, PathBuf::from("custom.log"));
        assert!(config.console.enabled);
    }
}
