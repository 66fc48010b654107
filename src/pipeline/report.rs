use super::operation::Operation;
use crate::error::LoaderError;
use crate::graph_store::GraphStats;
use crate::ingestion::{PartitionSummary, WriteSummary};
use crate::logging::DiagnosticsSummary;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// What happened to one requested operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum OperationStatus {
    Completed,
    Failed(String),
    /// Never attempted, because the run aborted first
    Skipped,
}

/// Totals from one `load` operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    pub artifacts: usize,
    pub writes: WriteSummary,
    pub stats: Option<GraphStats>,
}

/// A failure that stopped an operation, or the whole run when `operation` is `None`
#[derive(Debug)]
pub struct RunFailure {
    pub operation: Option<Operation>,
    pub error: LoaderError,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operation {
            Some(operation) => write!(f, "{} failed: ", operation)?,
            None => f.write_str("run aborted before any operation: ")?,
        }
        match &self.error {
            LoaderError::SchemaViolation(violation) => f.write_str(&violation.report()),
            other => write!(f, "{}", other),
        }
    }
}

/// Outcome of one pipeline run
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub operations: Vec<(Operation, OperationStatus)>,
    /// First fatal cause, kept for the user-facing summary
    pub first_failure: Option<RunFailure>,
    pub close_error: Option<String>,
    pub partition: Option<PartitionSummary>,
    pub load: Option<LoadSummary>,
    pub diagnostics: Option<DiagnosticsSummary>,
}

impl RunReport {
    pub fn new(run_id: Uuid, operations: &[Operation]) -> Self {
        Self {
            run_id,
            operations: operations
                .iter()
                .map(|op| (*op, OperationStatus::Skipped))
                .collect(),
            first_failure: None,
            close_error: None,
            partition: None,
            load: None,
            diagnostics: None,
        }
    }

    pub fn set_status(&mut self, index: usize, status: OperationStatus) {
        if let Some(entry) = self.operations.get_mut(index) {
            entry.1 = status;
        }
    }

    /// Keeps only the first failure; later ones are already in the diagnostics
    pub fn record_failure(&mut self, failure: RunFailure) {
        if self.first_failure.is_none() {
            self.first_failure = Some(failure);
        }
    }

    /// Preflight rejected the run: nothing was attempted
    pub fn fail_before_start(&mut self, error: LoaderError) {
        for entry in &mut self.operations {
            entry.1 = OperationStatus::Skipped;
        }
        self.record_failure(RunFailure {
            operation: None,
            error,
        });
    }

    pub fn status(&self, operation: Operation) -> Option<&OperationStatus> {
        self.operations
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, status)| status)
    }

    /// True when every requested operation completed and the store closed cleanly
    pub fn succeeded(&self) -> bool {
        self.first_failure.is_none()
            && self.close_error.is_none()
            && self
                .operations
                .iter()
                .all(|(_, status)| *status == OperationStatus::Completed)
    }

    pub fn exit_code(&self) -> u8 {
        if self.succeeded() {
            0
        } else {
            1
        }
    }

    /// Human-readable account of why the run did not succeed
    pub fn failure_summary(&self) -> Option<String> {
        if self.succeeded() {
            return None;
        }
        let mut lines = Vec::new();
        if let Some(failure) = &self.first_failure {
            lines.push(failure.to_string());
        }
        let failed: Vec<&str> = self
            .operations
            .iter()
            .filter(|(_, status)| matches!(status, OperationStatus::Failed(_)))
            .map(|(op, _)| op.name())
            .collect();
        if failed.len() > 1 {
            lines.push(format!("Failed operations: {}", failed.join(", ")));
        }
        let skipped: Vec<&str> = self
            .operations
            .iter()
            .filter(|(_, status)| *status == OperationStatus::Skipped)
            .map(|(op, _)| op.name())
            .collect();
        if !skipped.is_empty() {
            lines.push(format!("Not attempted: {}", skipped.join(", ")));
        }
        if let Some(close_error) = &self.close_error {
            lines.push(format!("Graph store did not close cleanly: {}", close_error));
        }
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_completed_exits_zero() {
        let mut report = RunReport::new(Uuid::new_v4(), &[Operation::Partition, Operation::Load]);
        report.set_status(0, OperationStatus::Completed);
        report.set_status(1, OperationStatus::Completed);
        assert_eq!(report.exit_code(), 0);
        assert!(report.failure_summary().is_none());
    }

    #[test]
    fn first_failure_is_kept() {
        let mut report = RunReport::new(Uuid::new_v4(), &[Operation::Extract, Operation::Load]);
        report.set_status(0, OperationStatus::Failed("missing".into()));
        report.record_failure(RunFailure {
            operation: Some(Operation::Extract),
            error: LoaderError::configuration("Archive missing"),
        });
        report.set_status(1, OperationStatus::Failed("later".into()));
        report.record_failure(RunFailure {
            operation: Some(Operation::Load),
            error: LoaderError::configuration("later"),
        });

        assert_eq!(report.exit_code(), 1);
        let summary = report.failure_summary().unwrap();
        assert!(summary.starts_with("extract failed: Configuration error: Archive missing"));
        assert!(summary.contains("Failed operations: extract, load"));
    }

    #[test]
    fn preflight_failure_skips_everything() {
        let mut report = RunReport::new(Uuid::new_v4(), &Operation::all());
        report.fail_before_start(LoaderError::configuration("batch size must be positive"));

        assert!(report
            .operations
            .iter()
            .all(|(_, status)| *status == OperationStatus::Skipped));
        let summary = report.failure_summary().unwrap();
        assert!(summary.contains("run aborted before any operation"));
        assert!(summary.contains("Not attempted: download, extract, partition, load"));
    }

    #[test]
    fn close_error_alone_fails_the_run() {
        let mut report = RunReport::new(Uuid::new_v4(), &[Operation::Load]);
        report.set_status(0, OperationStatus::Completed);
        report.close_error = Some("flush failed".into());
        assert_eq!(report.exit_code(), 1);
    }
}
