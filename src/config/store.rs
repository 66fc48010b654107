//! Graph store connection settings

use crate::error::{LoaderError, LoaderResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_STORE_URI: &str = "bolt://localhost:7687";
pub const DEFAULT_STORE_USER: &str = "neo4j";
pub const DEFAULT_STORE_PASSWORD: &str = "password";

const REMOTE_SCHEMES: [&str; 6] = ["bolt", "bolt+s", "bolt+ssc", "neo4j", "neo4j+s", "neo4j+ssc"];

/// Which graph store implementation a URI selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// Embedded store at a local path (`sled://<path>` or a bare path)
    Sled(PathBuf),
    /// Remote Neo4j server reached over Bolt
    Neo4j { uri: String },
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_STORE_URI.to_string(),
            user: DEFAULT_STORE_USER.to_string(),
            password: DEFAULT_STORE_PASSWORD.to_string(),
        }
    }
}

// Keeps the password out of logs and panic messages.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl StoreConfig {
    /// Resolve the backend named by the URI scheme
    pub fn backend(&self) -> LoaderResult<StoreBackend> {
        let uri = self.uri.trim();
        if uri.is_empty() {
            return Err(LoaderError::configuration("Store URI is required"));
        }

        match uri.split_once("://") {
            Some(("sled", path)) if !path.is_empty() => Ok(StoreBackend::Sled(PathBuf::from(path))),
            Some(("sled", _)) => Err(LoaderError::configuration(
                "sled:// store URI must name a directory",
            )),
            Some((scheme, _)) if REMOTE_SCHEMES.contains(&scheme) => Ok(StoreBackend::Neo4j {
                uri: uri.to_string(),
            }),
            Some((scheme, _)) => Err(LoaderError::configuration(format!(
                "Unsupported store URI scheme '{}'",
                scheme
            ))),
            None => Ok(StoreBackend::Sled(PathBuf::from(uri))),
        }
    }

    /// Check that the settings are usable for the backend they select
    pub fn validate(&self) -> LoaderResult<()> {
        match self.backend()? {
            StoreBackend::Sled(_) => Ok(()),
            StoreBackend::Neo4j { uri } => {
                if self.user.trim().is_empty() {
                    return Err(LoaderError::configuration(format!(
                        "A user name is required to connect to {}",
                        uri
                    )));
                }
                if cfg!(feature = "neo4j") {
                    Ok(())
                } else {
                    Err(LoaderError::configuration(format!(
                        "Store URI {} needs the `neo4j` feature; use a sled:// URI or rebuild with --features neo4j",
                        uri
                    )))
                }
            }
        }
    }
}
