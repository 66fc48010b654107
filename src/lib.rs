//! # Moviegraph
//!
//! Loads a large movie dataset into a property graph of `Movie` and `Actor` nodes
//! joined by `ACTED_IN` relationships. Every write is a keyed upsert, so the loader can
//! be re-run against a populated store without creating duplicates.
//!
//! ## Core Components
//!
//! * `config` - Loader and store settings from env vars, TOML and CLI flags
//! * `db_operations` - Embedded sled-backed graph store and its read side
//! * `error` - The loader's failure taxonomy
//! * `graph_store` - The store seam used by the writer, plus connectors
//! * `ingestion` - Download, extraction, cleaning, partitioning and batch writing
//! * `logging` - Process logging and the per-run diagnostics sink
//! * `pipeline` - Operation sequencing and run reports
//! * `schema` - The canonical movie record and its validator
//!
//! ## Architecture
//!
//! A run is an ordered list of operations (`download`, `extract`, `partition`, `load`).
//! The source file is validated row by row into `MovieRecord`s and split into one CSV
//! artifact per release decade. Loading re-reads each artifact and upserts it into the
//! graph store in fixed-size batches, each batch atomic on its own.

pub mod config;
pub mod db_operations;
pub mod error;
pub mod graph_store;
pub mod ingestion;
pub mod logging;
pub mod pipeline;
pub mod schema;

#[cfg(test)]
pub(crate) mod testing_utils;

// Re-export main types for convenience
pub use config::{LoaderConfig, StoreConfig};
pub use db_operations::DbOperations;
pub use error::{BatchWriteFailure, LoaderError, LoaderResult};
pub use graph_store::{GraphStore, GraphStats, SledGraphStore, StoreError, StoreResult};
pub use logging::{Diagnostics, LogConfig, LoggingSystem};
pub use pipeline::{Operation, PipelineOrchestrator, RunReport};
pub use schema::{MovieRecord, SchemaViolation};
