use std::path::Path;
use std::time::Duration;

use partition_matrix::engine::{Engine, Event, Request, StubEngine};
use partition_matrix::matrix::StepGraph;
use partition_matrix::types::{
    Partition, PipelineSelector, PipelineSnapshot, PipelineSnapshotOrError, StepHandle,
};

fn selector() -> PipelineSelector {
    PipelineSelector {
        repository_location_name: "etl".to_owned(),
        repository_name: "etl_repo".to_owned(),
        pipeline_name: "daily".to_owned(),
    }
}

fn fixture_path() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/partitions.json"))
}

#[test]
fn stub_engine_serves_snapshot_and_partitions() {
    let snapshot = PipelineSnapshot {
        steps: vec![StepHandle {
            name: "only".to_owned(),
            depends_on: vec![],
            depended_by: vec![],
        }],
    };
    let partitions = vec![Partition {
        name: "2024-01-01".to_owned(),
        runs: vec![],
    }];
    let handle = StubEngine::new(snapshot.clone(), partitions).start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();

    handle.send(Request::FetchPipeline {
        selector: selector(),
        reply_tx: tx.clone(),
    });
    match rx
        .recv_timeout(Duration::from_secs(2))
        .expect("engine should reply within 2 seconds")
    {
        Event::PipelineFetched {
            snapshot: PipelineSnapshotOrError::Snapshot(s),
        } => assert_eq!(s, snapshot),
        _ => panic!("expected PipelineFetched with a snapshot"),
    }

    handle.send(Request::FetchPartitions {
        selector: selector(),
        partition_set: "daily_partitions".to_owned(),
        force: true,
        reply_tx: tx,
    });
    match rx
        .recv_timeout(Duration::from_secs(2))
        .expect("engine should reply within 2 seconds")
    {
        Event::PartitionsFetched { partitions, .. } => {
            assert_eq!(partitions.len(), 1);
            assert_eq!(partitions[0].name, "2024-01-01");
        }
        _ => panic!("expected PartitionsFetched"),
    }

    handle.send(Request::Shutdown);
}

#[test]
fn fixture_file_loads_graph_and_runs() {
    let stub = StubEngine::from_fixture(fixture_path()).unwrap();

    let PipelineSnapshotOrError::Snapshot(snapshot) = &stub.snapshot else {
        panic!("fixture should carry a snapshot");
    };
    let graph = StepGraph::from_snapshot(snapshot);
    let order: Vec<String> = graph.layout_all().into_iter().map(|s| s.name).collect();
    assert_eq!(order, ["extract", "transform", "load", "audit"]);

    assert_eq!(stub.partitions.len(), 3);
    let first = &stub.partitions[0];
    assert_eq!(first.runs.len(), 2);
    assert_eq!(first.runs[0].start_unix(), 1_704_157_200);
    assert_eq!(first.runs[0].tag("dagster/backfill"), Some("xkcd"));
    let stats = first.runs[1].step_stats_for("transform").unwrap();
    assert_eq!(stats.expectations_passed(), 1);
    assert!(stub.partitions[2].runs.is_empty());
}

#[test]
fn missing_fixture_is_an_error() {
    let err = StubEngine::from_fixture(Path::new("/nonexistent/fixture.json"))
        .err()
        .expect("missing file should fail");
    assert!(format!("{err:#}").contains("fixture"));
}

#[test]
fn late_replies_to_dropped_views_are_ignored() {
    let handle = StubEngine::from_fixture(fixture_path()).unwrap().start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();
    drop(rx);
    handle.send(Request::FetchPartitions {
        selector: selector(),
        partition_set: "daily_partitions".to_owned(),
        force: false,
        reply_tx: tx,
    });

    // The engine keeps serving after a failed reply.
    let (tx, rx) = std::sync::mpsc::channel::<Event>();
    handle.send(Request::FetchPipeline {
        selector: selector(),
        reply_tx: tx,
    });
    assert!(matches!(
        rx.recv_timeout(Duration::from_secs(2)),
        Ok(Event::PipelineFetched { .. })
    ));
}
