use super::operation::Operation;
use super::report::{LoadSummary, OperationStatus, RunFailure, RunReport};
use crate::config::LoaderConfig;
use crate::error::{LoaderError, LoaderResult};
use crate::graph_store::{DefaultConnector, GraphStore, StoreConnector};
use crate::ingestion::{
    discover_artifacts, BatchWriter, DatasetArchive, DecadePartitioner, InvalidRowPolicy,
};
use crate::logging::{Diagnostics, LogFeature};

/// Runs requested operations in caller order under the continue-or-abort policy.
///
/// The graph store is opened on the first `load` and held for the rest of the run; it
/// is closed exactly once before [`run`](Self::run) returns, whatever happened.
pub struct PipelineOrchestrator<C = DefaultConnector> {
    config: LoaderConfig,
    connector: C,
}

impl PipelineOrchestrator<DefaultConnector> {
    pub fn new(config: LoaderConfig) -> Self {
        Self::with_connector(config, DefaultConnector)
    }
}

impl<C: StoreConnector> PipelineOrchestrator<C> {
    pub fn with_connector(config: LoaderConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub async fn run(&self, operations: &[Operation], diagnostics: &Diagnostics) -> RunReport {
        let mut report = RunReport::new(diagnostics.run_id(), operations);

        if let Err(e) = self.preflight(operations) {
            diagnostics.error(LogFeature::Pipeline, e.to_string());
            report.fail_before_start(e);
            report.diagnostics = Some(diagnostics.summary());
            return report;
        }

        let mut store: Option<Box<dyn GraphStore>> = None;

        for (index, operation) in operations.iter().copied().enumerate() {
            diagnostics.info(LogFeature::Pipeline, format!("Starting {}", operation));
            let result = self.execute(operation, &mut store, diagnostics, &mut report).await;

            match result {
                Ok(()) => {
                    diagnostics.info(LogFeature::Pipeline, format!("Completed {}", operation));
                    report.set_status(index, OperationStatus::Completed);
                }
                Err(e) => {
                    diagnostics.error(
                        LogFeature::Pipeline,
                        format!("Operation {} failed: {}", operation, e),
                    );
                    report.set_status(index, OperationStatus::Failed(e.to_string()));
                    report.record_failure(RunFailure {
                        operation: Some(operation),
                        error: e,
                    });

                    if !self.config.continue_on_error {
                        diagnostics.warn(
                            LogFeature::Pipeline,
                            "Aborting remaining operations; pass --continue-on-error to keep going",
                        );
                        break;
                    }
                }
            }
        }

        if let Some(store) = store {
            match store.close().await {
                Ok(()) => log::debug!(target: "moviegraph::store", "Graph store closed"),
                Err(e) => {
                    diagnostics.error(LogFeature::Store, format!("Failed to close graph store: {}", e));
                    report.close_error = Some(e.to_string());
                }
            }
        }

        let summary = diagnostics.summary();
        diagnostics.info(LogFeature::Pipeline, &summary);
        report.diagnostics = Some(summary);
        report
    }

    /// Configuration checks that must pass before anything touches the network or store
    fn preflight(&self, operations: &[Operation]) -> LoaderResult<()> {
        if operations.is_empty() {
            return Err(LoaderError::configuration("No operations requested"));
        }
        self.config.validate()?;
        if operations.contains(&Operation::Load) {
            self.config.store.validate()?;
        }
        Ok(())
    }

    async fn execute(
        &self,
        operation: Operation,
        store: &mut Option<Box<dyn GraphStore>>,
        diagnostics: &Diagnostics,
        report: &mut RunReport,
    ) -> LoaderResult<()> {
        let output_dir = &self.config.output_directory;
        match operation {
            Operation::Download => {
                DatasetArchive::new(output_dir, diagnostics)
                    .download(&self.config.csv_url)
                    .await?;
            }
            Operation::Extract => {
                DatasetArchive::new(output_dir, diagnostics).extract()?;
            }
            Operation::Partition => {
                let policy = if self.config.quarantine_invalid_rows {
                    InvalidRowPolicy::Quarantine
                } else {
                    InvalidRowPolicy::Fail
                };
                let summary = DecadePartitioner::new(diagnostics, policy)
                    .run(&self.config.source_path(), output_dir)?;
                report.partition = Some(summary);
            }
            Operation::Load => {
                let summary = self.load(store, diagnostics).await?;
                report.load = Some(summary);
            }
        }
        Ok(())
    }

    async fn load(
        &self,
        slot: &mut Option<Box<dyn GraphStore>>,
        diagnostics: &Diagnostics,
    ) -> LoaderResult<LoadSummary> {
        let output_dir = &self.config.output_directory;
        if !output_dir.is_dir() {
            return Err(LoaderError::configuration(format!(
                "Output directory {} does not exist",
                output_dir.display()
            )));
        }
        let artifacts = discover_artifacts(output_dir)?;
        if artifacts.is_empty() {
            return Err(LoaderError::configuration(format!(
                "No decade artifacts found in {}",
                output_dir.display()
            )));
        }
        diagnostics.info(
            LogFeature::Writer,
            format!(
                "Found {} artifacts: {}",
                artifacts.len(),
                artifacts
                    .iter()
                    .map(|(decade, _)| format!("{}s", decade))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        );

        let store = match slot.take() {
            Some(store) => store,
            None => self.connector.connect(&self.config.store).await?,
        };
        let store: &dyn GraphStore = &**slot.insert(store);

        store.ensure_constraints().await?;

        let writer = BatchWriter::new(store, diagnostics).with_batch_size(self.config.batch_size);
        let mut summary = LoadSummary::default();
        for (_, path) in &artifacts {
            let written = writer.write_artifact(path).await?;
            summary.artifacts += 1;
            summary.writes.merge(written);
        }

        summary.stats = store.graph_stats().await?;
        if let Some(stats) = &summary.stats {
            diagnostics.info(LogFeature::Store, format!("Graph now holds {}", stats));
        }
        if !summary.writes.failures.is_empty() {
            diagnostics.warn(
                LogFeature::Writer,
                format!(
                    "{} of {} batches failed to write",
                    summary.writes.failures.len(),
                    summary.writes.batches_attempted
                ),
            );
        }
        Ok(summary)
    }
}
