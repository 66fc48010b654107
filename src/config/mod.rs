//! Loader configuration
//!
//! Settings come from three layers, later ones winning: built-in defaults or a TOML
//! file, then environment variables, then command-line flags (applied by the binary).

pub mod store;

pub use store::{StoreBackend, StoreConfig};

use crate::error::{LoaderError, LoaderResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIRECTORY: &str = "src/neo4j/csv/chunks";
pub const DEFAULT_CSV_URL: &str =
    "https://www.kaggle.com/api/v1/datasets/download/alanvourch/tmdb-movies-daily-updates";
pub const DEFAULT_SOURCE_FILE: &str = "TMDB_all_movies.csv";
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Everything a pipeline run needs to know about its environment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoaderConfig {
    pub store: StoreConfig,
    /// Working directory for the archive, the source file and decade artifacts
    pub output_directory: PathBuf,
    /// Remote dataset archive
    pub csv_url: String,
    /// Combined source file name, relative to `output_directory`
    pub source_file: String,
    /// Rows per store write
    pub batch_size: usize,
    pub continue_on_error: bool,
    /// Divert rows that fail validation to `rejected_rows.csv` instead of failing
    pub quarantine_invalid_rows: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            csv_url: DEFAULT_CSV_URL.to_string(),
            source_file: DEFAULT_SOURCE_FILE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            continue_on_error: false,
            quarantine_invalid_rows: false,
        }
    }
}

impl LoaderConfig {
    /// Defaults overridden by whatever is set in the process environment
    pub fn from_env() -> LoaderResult<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> LoaderResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            LoaderError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| {
            LoaderError::configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. Unset variables leave values alone.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> LoaderResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup("NEO4J_URI") {
            self.store.uri = uri;
        }
        if let Some(user) = lookup("NEO4J_USER") {
            self.store.user = user;
        }
        if let Some(password) = lookup("NEO4J_PASSWORD") {
            self.store.password = password;
        }
        if let Some(dir) = lookup("OUTPUT_DIRECTORY") {
            self.output_directory = PathBuf::from(dir);
        }
        if let Some(url) = lookup("CSV_URL") {
            self.csv_url = url;
        }
        if let Some(file) = lookup("SOURCE_FILE") {
            self.source_file = file;
        }
        if let Some(size) = lookup("LOAD_BATCH_SIZE") {
            self.batch_size = size.trim().parse().map_err(|_| {
                LoaderError::configuration(format!("LOAD_BATCH_SIZE is not a number: {:?}", size))
            })?;
        }
        if let Some(flag) = lookup("CONTINUE_ON_ERROR") {
            self.continue_on_error = parse_flag("CONTINUE_ON_ERROR", &flag)?;
        }
        if let Some(flag) = lookup("QUARANTINE_INVALID_ROWS") {
            self.quarantine_invalid_rows = parse_flag("QUARANTINE_INVALID_ROWS", &flag)?;
        }
        Ok(())
    }

    /// Validate settings that every operation depends on.
    ///
    /// Store settings are checked separately by [`StoreConfig::validate`] because only
    /// the load operation touches the store.
    pub fn validate(&self) -> LoaderResult<()> {
        if self.output_directory.as_os_str().is_empty() {
            return Err(LoaderError::configuration("Output directory is required"));
        }
        if self.csv_url.trim().is_empty() {
            return Err(LoaderError::configuration("Source URL is required"));
        }
        if self.source_file.trim().is_empty() {
            return Err(LoaderError::configuration("Source file name is required"));
        }
        if self.batch_size == 0 {
            return Err(LoaderError::configuration(
                "Batch size must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn source_path(&self) -> PathBuf {
        self.output_directory.join(&self.source_file)
    }
}

fn parse_flag(name: &str, value: &str) -> LoaderResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(LoaderError::configuration(format!(
            "{} must be a boolean, got {:?}",
            name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_dataset_layout() {
        let config = LoaderConfig::default();
        assert_eq!(config.store.uri, "bolt://localhost:7687");
        assert_eq!(config.batch_size, 100);
        assert_eq!(
            config.source_path(),
            PathBuf::from("src/neo4j/csv/chunks/TMDB_all_movies.csv")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_replace_only_what_is_set() {
        let mut config = LoaderConfig::default();
        config
            .apply_overrides(lookup(&[
                ("NEO4J_URI", "sled:///tmp/movies"),
                ("LOAD_BATCH_SIZE", "25"),
                ("CONTINUE_ON_ERROR", "yes"),
            ]))
            .unwrap();
        assert_eq!(config.store.uri, "sled:///tmp/movies");
        assert_eq!(config.store.user, "neo4j");
        assert_eq!(config.batch_size, 25);
        assert!(config.continue_on_error);
        assert!(!config.quarantine_invalid_rows);
    }

    #[test]
    fn malformed_overrides_are_configuration_errors() {
        let mut config = LoaderConfig::default();
        assert!(config
            .apply_overrides(lookup(&[("LOAD_BATCH_SIZE", "lots")]))
            .is_err());
        assert!(config
            .apply_overrides(lookup(&[("CONTINUE_ON_ERROR", "maybe")]))
            .is_err());
    }

    #[test]
    fn zero_batch_size_fails_validation() {
        let config = LoaderConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LoaderError::Configuration(_))));
    }

    #[test]
    fn reads_toml_with_partial_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loader.toml");
        fs::write(
            &path,
            "output_directory = \"data\"\nbatch_size = 50\n\n[store]\nuri = \"sled://graph\"\n",
        )
        .unwrap();

        let config = LoaderConfig::from_file(&path).unwrap();
        assert_eq!(config.output_directory, PathBuf::from("data"));
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.store.uri, "sled://graph");
        assert_eq!(config.store.user, "neo4j");
        assert_eq!(config.source_file, DEFAULT_SOURCE_FILE);
    }

    #[test]
    fn malformed_toml_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loader.toml");
        fs::write(&path, "batch_size = \"many\"\n").unwrap();

        let result = LoaderConfig::from_file(&path);
        assert!(matches!(result, Err(LoaderError::Configuration(_))));
    }

    #[test]
    fn unreadable_file_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let result = LoaderConfig::from_file(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(LoaderError::Configuration(_))));
    }
}
