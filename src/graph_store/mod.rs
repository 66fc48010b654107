//! # Graph store
//!
//! The seam between the loader and whatever holds the movie graph. The loader only
//! ever needs three things from a store: declare the uniqueness constraints, upsert a
//! batch of movies with their cast, and close. Everything else (path queries, UI reads)
//! belongs to the store itself.
//!
//! Two implementations ship with the crate: the embedded [`SledGraphStore`] and, behind
//! the `neo4j` feature, a Bolt client for a Neo4j server.

#[cfg(feature = "neo4j")]
pub mod neo4j;

use crate::config::{StoreBackend, StoreConfig};
use crate::db_operations::DbOperations;
use crate::schema::MovieRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Label and key property of every uniqueness constraint the writer relies on
pub const REQUIRED_CONSTRAINTS: [(&str, &str); 2] = [("Movie", "id"), ("Actor", "name")];

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Uniqueness constraint on {0} has not been declared")]
    MissingConstraint(String),

    #[error("Transaction aborted: {0}")]
    Transaction(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[cfg(feature = "neo4j")]
    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One movie and its cast, ready to be merged into the graph.
///
/// `actors` holds trimmed, non-empty names with duplicates removed, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieUpsert {
    pub movie: MovieRecord,
    pub actors: Vec<String>,
}

impl MovieUpsert {
    pub fn from_record(movie: MovieRecord) -> Self {
        let mut seen = HashSet::new();
        let actors = movie
            .cast
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .filter(|name| seen.insert(name.to_string()))
            .map(str::to_string)
            .collect();
        Self { movie, actors }
    }
}

/// What one committed batch changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub movies_upserted: usize,
    /// Zero when the backend cannot tell creates from updates
    pub movies_created: usize,
    pub actors_created: usize,
    pub relationships_created: usize,
}

impl BatchOutcome {
    pub fn merge(&mut self, other: BatchOutcome) {
        self.movies_upserted += other.movies_upserted;
        self.movies_created += other.movies_created;
        self.actors_created += other.actors_created;
        self.relationships_created += other.relationships_created;
    }
}

/// Node and relationship counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub movies: u64,
    pub actors: u64,
    pub relationships: u64,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} movies, {} actors, {} ACTED_IN relationships",
            self.movies, self.actors, self.relationships
        )
    }
}

/// Write side of the movie graph
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Declare uniqueness on `Movie.id` and `Actor.name`. A no-op when already present.
    async fn ensure_constraints(&self) -> StoreResult<()>;

    /// Upsert every movie in `batch`, then merge its actors and `ACTED_IN` edges.
    ///
    /// The batch is one unit of work: on error nothing from it is committed.
    async fn write_batch(&self, batch: &[MovieUpsert]) -> StoreResult<BatchOutcome>;

    /// Current counts, if the backend can report them
    async fn graph_stats(&self) -> StoreResult<Option<GraphStats>> {
        Ok(None)
    }

    /// Flush and release the connection
    async fn close(&self) -> StoreResult<()>;
}

/// Opens a [`GraphStore`] for a run
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, config: &StoreConfig) -> StoreResult<Box<dyn GraphStore>>;
}

/// Picks the backend from the store URI scheme
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConnector;

#[async_trait]
impl StoreConnector for DefaultConnector {
    async fn connect(&self, config: &StoreConfig) -> StoreResult<Box<dyn GraphStore>> {
        let backend = config
            .backend()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        match backend {
            StoreBackend::Sled(path) => {
                log::info!(target: "moviegraph::store", "Opening embedded graph store at {}", path.display());
                Ok(Box::new(SledGraphStore::open(&path)?))
            }
            #[cfg(feature = "neo4j")]
            StoreBackend::Neo4j { uri } => {
                log::info!(target: "moviegraph::store", "Connecting to Neo4j at {}", uri);
                let store = neo4j::Neo4jGraphStore::connect(&uri, &config.user, &config.password).await?;
                Ok(Box::new(store))
            }
            #[cfg(not(feature = "neo4j"))]
            StoreBackend::Neo4j { uri } => Err(StoreError::Connection(format!(
                "{} requires the `neo4j` feature",
                uri
            ))),
        }
    }
}

/// [`GraphStore`] over the embedded sled database
#[derive(Clone)]
pub struct SledGraphStore {
    db_ops: DbOperations,
}

impl SledGraphStore {
    pub fn open(path: &std::path::Path) -> StoreResult<Self> {
        Ok(Self {
            db_ops: DbOperations::open(path)?,
        })
    }

    pub fn new(db_ops: DbOperations) -> Self {
        Self { db_ops }
    }

    /// Read access to the graph this store writes
    pub fn db_ops(&self) -> &DbOperations {
        &self.db_ops
    }
}

#[async_trait]
impl GraphStore for SledGraphStore {
    async fn ensure_constraints(&self) -> StoreResult<()> {
        for (label, property) in REQUIRED_CONSTRAINTS {
            if self.db_ops.declare_constraint(label, property)? {
                log::info!(target: "moviegraph::store", "Created uniqueness constraint on {}.{}", label, property);
            } else {
                log::debug!(target: "moviegraph::store", "Constraint on {}.{} already present", label, property);
            }
        }
        Ok(())
    }

    async fn write_batch(&self, batch: &[MovieUpsert]) -> StoreResult<BatchOutcome> {
        self.db_ops.upsert_movies(batch)
    }

    async fn graph_stats(&self) -> StoreResult<Option<GraphStats>> {
        Ok(Some(self.db_ops.graph_stats()))
    }

    async fn close(&self) -> StoreResult<()> {
        self.db_ops.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing_utils::movie;
    use tempfile::tempdir;

    fn record(id: i64, cast: &[&str]) -> MovieRecord {
        movie(id, &format!("Movie {}", id), "1994-07-06", cast)
    }

    #[test]
    fn upsert_normalizes_cast_names() {
        let upsert = MovieUpsert::from_record(record(1, &["Tom Hanks", " Tom Hanks ", "", "Meg Ryan"]));
        assert_eq!(upsert.actors, vec!["Tom Hanks", "Meg Ryan"]);
    }

    #[test]
    fn outcomes_accumulate() {
        let mut total = BatchOutcome::default();
        total.merge(BatchOutcome {
            movies_upserted: 2,
            movies_created: 1,
            actors_created: 3,
            relationships_created: 4,
        });
        total.merge(BatchOutcome {
            movies_upserted: 1,
            ..Default::default()
        });
        assert_eq!(total.movies_upserted, 3);
        assert_eq!(total.relationships_created, 4);
    }

    #[tokio::test]
    async fn sled_store_requires_constraints_before_writes() {
        let dir = tempdir().unwrap();
        let store = SledGraphStore::open(&dir.path().join("graph")).unwrap();
        let batch = vec![MovieUpsert::from_record(record(1, &["Tom Hanks"]))];

        let result = store.write_batch(&batch).await;
        assert!(matches!(result, Err(StoreError::MissingConstraint(_))));

        store.ensure_constraints().await.unwrap();
        store.ensure_constraints().await.unwrap();
        let outcome = store.write_batch(&batch).await.unwrap();
        assert_eq!(outcome.movies_created, 1);
        assert_eq!(outcome.relationships_created, 1);

        let stats = store.graph_stats().await.unwrap().unwrap();
        assert_eq!(stats, GraphStats { movies: 1, actors: 1, relationships: 1 });
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn default_connector_opens_sled_uris() {
        let dir = tempdir().unwrap();
        let config = StoreConfig {
            uri: format!("sled://{}", dir.path().join("graph").display()),
            ..Default::default()
        };
        let store = DefaultConnector.connect(&config).await.unwrap();
        store.ensure_constraints().await.unwrap();
        assert_eq!(store.graph_stats().await.unwrap(), Some(GraphStats::default()));
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn default_connector_rejects_unknown_schemes() {
        let config = StoreConfig {
            uri: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            DefaultConnector.connect(&config).await,
            Err(StoreError::Connection(_))
        ));
    }
}
