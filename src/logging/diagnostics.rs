//! Per-run diagnostics sink.
//!
//! A [`Diagnostics`] value is created for one pipeline run and handed by reference to
//! every component that can observe an anomaly. Each event is emitted through the `log`
//! facade under its feature target and also retained, so callers and tests can inspect
//! what happened without scraping log output.

use super::features::LogFeature;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

/// Retained events per run before older detail is dropped (counters keep counting)
pub const DEFAULT_RETENTION: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    fn level(self) -> log::Level {
        match self {
            Severity::Warning => log::Level::Warn,
            Severity::Error => log::Level::Error,
        }
    }
}

/// One recorded anomaly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub severity: Severity,
    pub feature: LogFeature,
    pub message: String,
    /// Source row ordinal, when the event concerns a single row
    pub row: Option<usize>,
    pub field: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl DiagnosticEvent {
    pub fn warning(feature: LogFeature, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, feature, message)
    }

    pub fn error(feature: LogFeature, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, feature, message)
    }

    fn new(severity: Severity, feature: LogFeature, message: impl Into<String>) -> Self {
        Self {
            severity,
            feature,
            message: message.into(),
            row: None,
            field: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn at_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Warning and error counts for one feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCounts {
    pub warnings: usize,
    pub errors: usize,
}

/// Serializable end-of-run summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub warnings: usize,
    pub errors: usize,
    pub by_feature: BTreeMap<LogFeature, FeatureCounts>,
    pub dropped_events: usize,
}

impl fmt::Display for DiagnosticsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {}: {} warning(s), {} error(s)",
            self.run_id, self.warnings, self.errors
        )?;
        for (feature, counts) in &self.by_feature {
            write!(f, "; {} {}/{}", feature, counts.warnings, counts.errors)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct DiagnosticsState {
    events: Vec<DiagnosticEvent>,
    dropped: usize,
    counts: BTreeMap<LogFeature, FeatureCounts>,
}

/// Structured diagnostics sink scoped to one pipeline run
pub struct Diagnostics {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    retention: usize,
    state: Mutex<DiagnosticsState>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            retention,
            state: Mutex::new(DiagnosticsState::default()),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Progress and status lines. Logged only, never retained.
    pub fn info(&self, feature: LogFeature, message: impl fmt::Display) {
        log::info!(target: feature.target(), "{}", message);
    }

    pub fn warn(&self, feature: LogFeature, message: impl Into<String>) {
        self.record(DiagnosticEvent::warning(feature, message));
    }

    pub fn error(&self, feature: LogFeature, message: impl Into<String>) {
        self.record(DiagnosticEvent::error(feature, message));
    }

    /// Emit and retain an event
    pub fn record(&self, event: DiagnosticEvent) {
        match (event.row, event.field.as_deref()) {
            (Some(row), Some(field)) => log::log!(
                target: event.feature.target(),
                event.severity.level(),
                "[row {} / {}] {}",
                row,
                field,
                event.message
            ),
            (Some(row), None) => log::log!(
                target: event.feature.target(),
                event.severity.level(),
                "[row {}] {}",
                row,
                event.message
            ),
            _ => log::log!(
                target: event.feature.target(),
                event.severity.level(),
                "{}",
                event.message
            ),
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let counts = state.counts.entry(event.feature).or_default();
        match event.severity {
            Severity::Warning => counts.warnings += 1,
            Severity::Error => counts.errors += 1,
        }
        if state.events.len() < self.retention {
            state.events.push(event);
        } else {
            state.dropped += 1;
        }
    }

    /// Retained events, oldest first
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .counts
            .values()
            .map(|counts| match severity {
                Severity::Warning => counts.warnings,
                Severity::Error => counts.errors,
            })
            .sum()
    }

    pub fn counts_for(&self, feature: LogFeature) -> FeatureCounts {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.counts.get(&feature).copied().unwrap_or_default()
    }

    pub fn summary(&self) -> DiagnosticsSummary {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        DiagnosticsSummary {
            run_id: self.run_id,
            started_at: self.started_at,
            warnings: state.counts.values().map(|c| c.warnings).sum(),
            errors: state.counts.values().map(|c| c.errors).sum(),
            by_feature: state.counts.clone(),
            dropped_events: state.dropped,
        }
    }
}
