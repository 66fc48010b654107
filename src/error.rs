use crate::graph_store::StoreError;
use crate::schema::SchemaViolation;
use std::fmt;
use thiserror::Error;

/// Boxed error used where the underlying failure comes from heterogeneous collaborators
/// (filesystem, HTTP client, archive reader).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for the loader.
///
/// Each variant corresponds to one failure class of the pipeline. Whether a given
/// failure aborts the run is decided by the pipeline orchestrator, never by the
/// component that produced it.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// A source row failed required-field or type checks
    #[error("{0}")]
    SchemaViolation(Box<SchemaViolation>),

    /// Network download or filesystem access failed. Not retried.
    #[error("I/O failure while {context}: {source}")]
    TransientIo {
        context: String,
        #[source]
        source: BoxError,
    },

    /// A single batch could not be written to the graph store
    #[error("{0}")]
    BatchWrite(BatchWriteFailure),

    /// Missing connection parameters or missing source files
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Graph store failure outside the scope of a single batch
    #[error("Graph store error: {0}")]
    Store(#[from] StoreError),
}

impl LoaderError {
    /// Create a new configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new transient I/O error with a description of what was being attempted
    pub fn transient_io(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::TransientIo {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Whether this failure came from row validation
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Self::SchemaViolation(_))
    }
}

impl From<SchemaViolation> for LoaderError {
    fn from(violation: SchemaViolation) -> Self {
        Self::SchemaViolation(Box::new(violation))
    }
}

impl From<BatchWriteFailure> for LoaderError {
    fn from(failure: BatchWriteFailure) -> Self {
        Self::BatchWrite(failure)
    }
}

/// Context for a batch that failed to commit.
///
/// Rows are 1-based data-row ordinals within `source`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BatchWriteFailure {
    pub source: String,
    pub batch_index: usize,
    pub first_row: usize,
    pub last_row: usize,
    pub cause: String,
}

impl fmt::Display for BatchWriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to write batch {} (rows {}-{}) from {}: {}",
            self.batch_index, self.first_row, self.last_row, self.source, self.cause
        )
    }
}

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;
