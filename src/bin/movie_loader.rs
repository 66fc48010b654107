use clap::Parser;
use moviegraph::{Diagnostics, LoaderConfig, LogConfig, LoggingSystem, Operation, PipelineOrchestrator};
use std::path::PathBuf;
use std::process::ExitCode;

const STORE_HELP: &str = "\
The graph store defaults to NEO4J_URI (bolt://localhost:7687), which needs a build with
`--features neo4j`. Without it, pass --store-uri sled://<dir> (or set NEO4J_URI) to load
into the embedded store.";

#[derive(Parser)]
#[command(author, version, about, long_about = None, after_help = STORE_HELP)]
struct Cli {
    /// Operations to run, in order (download, extract, partition/chunk, load)
    #[arg(required = true, value_enum)]
    operations: Vec<Operation>,

    /// Keep going after a failed operation; the exit status still reports it
    #[arg(long)]
    continue_on_error: bool,

    /// Write rows that fail validation to rejected_rows.csv instead of failing
    #[arg(long)]
    quarantine_invalid_rows: bool,

    /// Loader settings in TOML; environment variables still override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for the archive, the source file and decade artifacts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Graph store URI (bolt://, neo4j://, sled://<path> or a plain path).
    /// Remote URIs need the `neo4j` feature
    #[arg(long)]
    store_uri: Option<String>,

    /// Rows per store write
    #[arg(long)]
    batch_size: Option<usize>,

    /// Diagnostics file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn loader_config(&self) -> moviegraph::LoaderResult<LoaderConfig> {
        let mut config = match &self.config {
            Some(path) => LoaderConfig::from_file(path)?,
            None => LoaderConfig::from_env()?,
        };
        if let Some(dir) = &self.output_dir {
            config.output_directory = dir.clone();
        }
        if let Some(uri) = &self.store_uri {
            config.store.uri = uri.clone();
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        config.continue_on_error |= self.continue_on_error;
        config.quarantine_invalid_rows |= self.quarantine_invalid_rows;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = match LogConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid logging configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let log_config = match &cli.log_file {
        Some(path) => log_config.with_log_file(path),
        None => log_config,
    };
    let _guard = match LoggingSystem::init(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match cli.loader_config() {
        Ok(config) => config,
        Err(e) => {
            log::error!(target: "moviegraph::pipeline", "{}", e);
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let diagnostics = Diagnostics::new();
    log::info!(
        target: "moviegraph::pipeline",
        "Run {} starting: {}",
        diagnostics.run_id(),
        cli.operations
            .iter()
            .map(Operation::name)
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    let report = PipelineOrchestrator::new(config)
        .run(&cli.operations, &diagnostics)
        .await;

    if let Some(summary) = report.failure_summary() {
        eprintln!("{}", summary);
    }
    ExitCode::from(report.exit_code())
}
