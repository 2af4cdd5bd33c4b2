use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::types::{Partition, PipelineSnapshot, PipelineSnapshotOrError};

use super::interface::{Engine, EngineHandle, Event, Request};

/// A stub engine that serves pre-loaded fixture data without any network calls.
///
/// Useful for integration tests and offline demos (`--fixture`).
pub struct StubEngine {
    pub snapshot: PipelineSnapshotOrError,
    pub partitions: Vec<Partition>,
}

#[derive(Deserialize)]
struct Fixture {
    #[serde(default)]
    snapshot: Option<PipelineSnapshotOrError>,
    #[serde(default)]
    partitions: Vec<Partition>,
}

impl StubEngine {
    pub fn new(snapshot: PipelineSnapshot, partitions: Vec<Partition>) -> Self {
        Self {
            snapshot: PipelineSnapshotOrError::Snapshot(snapshot),
            partitions,
        }
    }

    /// Load a JSON fixture of the form `{"snapshot": ..., "partitions": [...]}`.
    ///
    /// A fixture without a snapshot yields an empty step graph.
    pub fn from_fixture(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        let fixture: Fixture = serde_json::from_str(&raw)
            .with_context(|| format!("parsing fixture {}", path.display()))?;
        Ok(Self {
            snapshot: fixture
                .snapshot
                .unwrap_or_else(|| PipelineSnapshotOrError::Snapshot(PipelineSnapshot::default())),
            partitions: fixture.partitions,
        })
    }
}

impl Engine for StubEngine {
    fn start(self) -> EngineHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        std::thread::spawn(move || match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(self.run_loop(rx)),
            Err(e) => tracing::error!("stub engine: tokio runtime init failed: {e}"),
        });
        EngineHandle::new(tx)
    }
}

impl StubEngine {
    async fn run_loop(self, mut rx: UnboundedReceiver<Request>) {
        while let Some(req) = rx.recv().await {
            match req {
                Request::FetchPipeline { reply_tx, .. } => {
                    let _ = reply_tx.send(Event::PipelineFetched {
                        snapshot: self.snapshot.clone(),
                    });
                }
                Request::FetchPartitions { reply_tx, .. } => {
                    let _ = reply_tx.send(Event::PartitionsFetched {
                        partitions: self.partitions.clone(),
                        fetched_at: Utc::now(),
                    });
                }
                // Fixture data never changes.
                Request::RegisterRefresh { .. } => {}
                Request::Shutdown => break,
            }
        }
    }
}
