//! End-to-end runs of the loader against the embedded graph store

mod common;

use common::{movie, LoaderFixture};
use moviegraph::graph_store::MovieUpsert;
use moviegraph::ingestion::artifact_file_name;
use moviegraph::pipeline::OperationStatus;
use moviegraph::{
    Diagnostics, GraphStore, LoaderError, Operation, PipelineOrchestrator, SledGraphStore,
};

#[tokio::test]
async fn partition_then_load_builds_the_graph() {
    let fixture = LoaderFixture::new();
    fixture.write_source(&[
        movie(862, "Toy Story", "1995-10-30", &["Tom Hanks", "Tim Allen"]),
        movie(13, "Forrest Gump", "1994-06-23", &["Tom Hanks", "Robin Wright"]),
        movie(120, "The Fellowship of the Ring", "2001-12-18", &["Elijah Wood"]),
    ]);

    // A movie already in the store is updated in place, never duplicated
    {
        let store = SledGraphStore::open(&fixture.graph_dir).unwrap();
        store.ensure_constraints().await.unwrap();
        store
            .write_batch(&[MovieUpsert::from_record(movie(13, "Gump (draft)", "1994-06-23", &[]))])
            .await
            .unwrap();
        store.close().await.unwrap();
    }

    let diagnostics = Diagnostics::new();
    let report = PipelineOrchestrator::new(fixture.config())
        .run(&[Operation::Partition, Operation::Load], &diagnostics)
        .await;

    assert_eq!(report.exit_code(), 0, "{:?}", report.failure_summary());
    assert!(fixture.output_dir.join(artifact_file_name(1990)).is_file());
    assert!(fixture.output_dir.join(artifact_file_name(2000)).is_file());

    let partition = report.partition.as_ref().unwrap();
    assert_eq!(partition.rows_read, 3);
    assert_eq!(partition.artifacts.len(), 2);

    let load = report.load.as_ref().unwrap();
    assert_eq!(load.artifacts, 2);
    assert_eq!(load.writes.rows_written, 3);

    let graph = fixture.graph();
    let stats = graph.graph_stats();
    assert_eq!(stats.movies, 3);
    assert_eq!(stats.actors, 4);
    assert_eq!(stats.relationships, 5);
    assert_eq!(graph.get_movie(13).unwrap().unwrap().title, "Forrest Gump");
    assert_eq!(graph.movies_for_actor("Tom Hanks").unwrap().len(), 2);
}

#[tokio::test]
async fn rerunning_load_changes_nothing() {
    let fixture = LoaderFixture::new();
    fixture.write_source(&[
        movie(1, "Heat", "1995-12-15", &["Al Pacino", "Robert De Niro"]),
        movie(2, "Ronin", "1998-09-25", &["Robert De Niro"]),
    ]);

    let orchestrator = PipelineOrchestrator::new(fixture.config());
    let first = orchestrator
        .run(&[Operation::Partition, Operation::Load], &Diagnostics::new())
        .await;
    assert_eq!(first.exit_code(), 0);
    let before = fixture.graph().graph_stats();

    let second = orchestrator.run(&[Operation::Load], &Diagnostics::new()).await;
    assert_eq!(second.exit_code(), 0);
    let outcome = second.load.as_ref().unwrap().writes.outcome;
    assert_eq!(outcome.movies_created, 0);
    assert_eq!(outcome.actors_created, 0);
    assert_eq!(outcome.relationships_created, 0);

    assert_eq!(fixture.graph().graph_stats(), before);
}

#[tokio::test]
async fn padded_actor_names_resolve_to_one_node() {
    let fixture = LoaderFixture::new();
    let store = SledGraphStore::open(&fixture.graph_dir).unwrap();
    store.ensure_constraints().await.unwrap();

    store
        .write_batch(&[
            MovieUpsert::from_record(movie(1, "Big", "1988-06-03", &["Tom Hanks"])),
            MovieUpsert::from_record(movie(2, "Splash", "1984-03-09", &[" Tom Hanks "])),
        ])
        .await
        .unwrap();

    let graph = store.db_ops();
    assert_eq!(graph.graph_stats().actors, 1);
    assert_eq!(graph.get_actor("  Tom Hanks").unwrap().unwrap().name, "Tom Hanks");
    assert_eq!(graph.movies_for_actor("Tom Hanks").unwrap().len(), 2);
}

#[tokio::test]
async fn failed_operation_stops_the_run_by_default() {
    let fixture = LoaderFixture::new();
    fixture.write_source(&[movie(1, "Heat", "1995-12-15", &[])]);

    let report = PipelineOrchestrator::new(fixture.config())
        .run(&[Operation::Extract, Operation::Partition], &Diagnostics::new())
        .await;

    assert_eq!(report.exit_code(), 1);
    assert!(matches!(
        report.first_failure.as_ref().map(|f| &f.error),
        Some(LoaderError::Configuration(_))
    ));
    assert_eq!(report.status(Operation::Partition), Some(&OperationStatus::Skipped));
    assert!(!fixture.output_dir.join(artifact_file_name(1990)).exists());
}

#[tokio::test]
async fn continue_on_error_still_runs_later_operations() {
    let fixture = LoaderFixture::new();
    fixture.write_source(&[movie(1, "Heat", "1995-12-15", &[])]);
    let mut config = fixture.config();
    config.continue_on_error = true;

    let report = PipelineOrchestrator::new(config)
        .run(&[Operation::Extract, Operation::Partition], &Diagnostics::new())
        .await;

    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.status(Operation::Partition), Some(&OperationStatus::Completed));
    assert!(fixture.output_dir.join(artifact_file_name(1990)).is_file());
    assert!(report.failure_summary().unwrap().starts_with("extract failed"));
}

#[tokio::test]
async fn remote_store_without_driver_fails_before_any_work() {
    if cfg!(feature = "neo4j") {
        return;
    }
    let fixture = LoaderFixture::new();
    fixture.write_source(&[movie(1, "Heat", "1995-12-15", &[])]);
    let mut config = fixture.config();
    config.store.uri = "bolt://localhost:7687".to_string();

    let report = PipelineOrchestrator::new(config)
        .run(&[Operation::Partition, Operation::Load], &Diagnostics::new())
        .await;

    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.status(Operation::Partition), Some(&OperationStatus::Skipped));
    assert!(!fixture.output_dir.join(artifact_file_name(1990)).exists());
}
