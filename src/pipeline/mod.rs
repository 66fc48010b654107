//! # Pipeline
//!
//! Sequences the requested [`Operation`]s, applies the continue-on-error policy and
//! owns the graph store handle for the duration of a run.
//!
//! Components report failures as [`LoaderError`](crate::error::LoaderError) values and
//! never decide whether the run survives them; that decision lives in
//! [`PipelineOrchestrator::run`].

pub mod operation;
pub mod orchestrator;
pub mod report;

pub use operation::Operation;
pub use orchestrator::PipelineOrchestrator;
pub use report::{LoadSummary, OperationStatus, RunFailure, RunReport};
