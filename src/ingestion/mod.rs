//! # Ingestion Module
//!
//! Everything between the remote dataset and the graph store.
//!
//! ## Components
//!
//! * `archive` - Download and unpack the dataset archive
//! * `source` - Streaming CSV reader producing raw and validated rows
//! * `cleaner` - Numeric and list normalization ahead of validation
//! * `partitioner` - Groups validated records into per-decade artifacts
//! * `writer` - Batched, idempotent upserts of artifacts into the graph store
//!
//! ## Architecture
//!
//! 1. Raw rows are read from the combined source file
//! 2. Each row is cleaned, then validated into a `MovieRecord`
//! 3. Valid records are grouped by release decade and written to `{decade}s_movies.csv`
//! 4. Each artifact is re-read and written to the store 100 rows at a time

pub mod archive;
pub mod cleaner;
pub mod partitioner;
pub mod source;
pub mod writer;


// Public re-exports
pub use archive::{DatasetArchive, ARCHIVE_FILE_NAME};
pub use cleaner::FieldCleaner;
pub use partitioner::{
    artifact_file_name, discover_artifacts, ArtifactInfo, DecadePartition, DecadePartitioner,
    InvalidRowPolicy, PartitionSummary, REJECTED_ROWS_FILE,
};
pub use source::{RecordStream, SourceReader};
pub use writer::{BatchWriter, WriteSummary};
