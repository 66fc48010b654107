//! Batched, idempotent writes of decade artifacts to the graph store.

use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::{BatchWriteFailure, LoaderError, LoaderResult};
use crate::graph_store::{BatchOutcome, GraphStore, MovieUpsert};
use crate::ingestion::source::RecordStream;
use crate::logging::{DiagnosticEvent, Diagnostics, LogFeature};
use crate::schema::MovieRecord;
use serde::Serialize;
use std::path::Path;

/// Result of writing one artifact (or one in-memory record sequence)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WriteSummary {
    pub source: String,
    pub rows_read: usize,
    /// Rows that could not be re-parsed from the artifact
    pub rows_skipped: usize,
    pub rows_written: usize,
    pub batches_attempted: usize,
    pub batches_committed: usize,
    pub outcome: BatchOutcome,
    pub failures: Vec<BatchWriteFailure>,
}

impl WriteSummary {
    pub fn merge(&mut self, other: WriteSummary) {
        self.rows_read += other.rows_read;
        self.rows_skipped += other.rows_skipped;
        self.rows_written += other.rows_written;
        self.batches_attempted += other.batches_attempted;
        self.batches_committed += other.batches_committed;
        self.outcome.merge(other.outcome);
        self.failures.extend(other.failures);
    }
}

/// Pending rows plus the source ordinals they came from
struct PendingBatch {
    upserts: Vec<MovieUpsert>,
    first_row: usize,
    last_row: usize,
}

impl PendingBatch {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            upserts: Vec::with_capacity(capacity),
            first_row: 0,
            last_row: 0,
        }
    }

    fn push(&mut self, row: usize, upsert: MovieUpsert) {
        if self.upserts.is_empty() {
            self.first_row = row;
        }
        self.last_row = row;
        self.upserts.push(upsert);
    }
}

/// Streams records into the store in fixed-size batches.
///
/// Each batch is its own unit of work. A failed batch is recorded with its source and
/// row range and the writer moves on to the next one.
pub struct BatchWriter<'a> {
    store: &'a dyn GraphStore,
    batch_size: usize,
    diagnostics: &'a Diagnostics,
}

impl<'a> BatchWriter<'a> {
    pub fn new(store: &'a dyn GraphStore, diagnostics: &'a Diagnostics) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
            diagnostics,
        }
    }

    /// Rows per batch. Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Write every row of a decade artifact.
    ///
    /// Fails only when the artifact cannot be read; rows that fail to re-parse are
    /// skipped and recorded.
    pub async fn write_artifact(&self, path: &Path) -> LoaderResult<WriteSummary> {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.diagnostics.info(
            LogFeature::Writer,
            format!("Loading movies from {}", source),
        );

        let stream = RecordStream::open_artifact(path, self.diagnostics)?;
        self.write_stream(&source, stream.enumerate().map(|(i, r)| (i + 1, r)))
            .await
    }

    /// Write in-memory records, numbering rows from 1
    pub async fn write_records<I>(&self, source: &str, records: I) -> LoaderResult<WriteSummary>
    where
        I: IntoIterator<Item = MovieRecord>,
    {
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| (i + 1, Ok(record)));
        self.write_stream(source, rows).await
    }

    async fn write_stream<I>(&self, source: &str, rows: I) -> LoaderResult<WriteSummary>
    where
        I: Iterator<Item = (usize, LoaderResult<MovieRecord>)>,
    {
        let mut summary = WriteSummary {
            source: source.to_string(),
            ..Default::default()
        };
        let mut batch = PendingBatch::with_capacity(self.batch_size);

        for (row, result) in rows {
            summary.rows_read += 1;
            match result {
                Ok(record) => batch.push(row, MovieUpsert::from_record(record)),
                Err(LoaderError::SchemaViolation(violation)) => {
                    summary.rows_skipped += 1;
                    self.diagnostics.record(
                        DiagnosticEvent::error(
                            LogFeature::Writer,
                            format!("Skipping unreadable row in {}: {}", source, violation),
                        )
                        .at_row(row)
                        .on_field(violation.field.clone()),
                    );
                }
                Err(other) => return Err(other),
            }

            if batch.upserts.len() >= self.batch_size {
                self.flush(&mut summary, &batch).await;
                batch = PendingBatch::with_capacity(self.batch_size);
            }
        }

        if !batch.upserts.is_empty() {
            self.flush(&mut summary, &batch).await;
        }

        self.diagnostics.info(
            LogFeature::Writer,
            format!(
                "Finished {}: {} rows written in {}/{} batches",
                source, summary.rows_written, summary.batches_committed, summary.batches_attempted
            ),
        );
        Ok(summary)
    }

    async fn flush(&self, summary: &mut WriteSummary, batch: &PendingBatch) {
        summary.batches_attempted += 1;
        let batch_index = summary.batches_attempted;

        match self.store.write_batch(&batch.upserts).await {
            Ok(outcome) => {
                summary.batches_committed += 1;
                summary.rows_written += batch.upserts.len();
                summary.outcome.merge(outcome);
                self.diagnostics.info(
                    LogFeature::Writer,
                    format!("Processed {} rows from {}", batch.last_row, summary.source),
                );
            }
            Err(e) => {
                let failure = BatchWriteFailure {
                    source: summary.source.clone(),
                    batch_index,
                    first_row: batch.first_row,
                    last_row: batch.last_row,
                    cause: e.to_string(),
                };
                self.diagnostics.record(
                    DiagnosticEvent::error(LogFeature::Writer, failure.to_string())
                        .at_row(batch.first_row),
                );
                summary.failures.push(failure);
            }
        }
    }
}
