use std::sync::mpsc::Sender;

use chrono::{DateTime, Utc};

use crate::types::{Partition, PipelineSelector, PipelineSnapshotOrError};

/// Handle to the backend engine held by the UI layer.
///
/// Cheaply cloneable. When the last handle is dropped the sender channel
/// closes, signalling the engine to shut down.
#[derive(Clone)]
pub struct EngineHandle {
    tx: tokio::sync::mpsc::UnboundedSender<Request>,
}

impl EngineHandle {
    pub(super) fn new(tx: tokio::sync::mpsc::UnboundedSender<Request>) -> Self {
        Self { tx }
    }

    /// Send a request to the engine. Non-blocking, returns immediately.
    pub fn send(&self, req: Request) {
        // Ignore errors: if the receiver is gone the engine has already shut down.
        let _ = self.tx.send(req);
    }
}

/// Trait implemented by both `DagsterEngine` and `StubEngine`.
pub trait Engine: Send + 'static {
    fn start(self) -> EngineHandle;
}

/// All operations the UI layer can send to the engine.
///
/// Replies go to the `Sender<Event>` carried by the request. A view that has
/// been torn down drops its receiver, and late replies are discarded.
pub enum Request {
    /// Load the step graph of a pipeline.
    FetchPipeline {
        selector: PipelineSelector,
        reply_tx: Sender<Event>,
    },
    /// Load all partitions of a partition set with their runs.
    FetchPartitions {
        selector: PipelineSelector,
        partition_set: String,
        /// Skip the moka cache and fetch fresh data.
        force: bool,
        reply_tx: Sender<Event>,
    },
    /// Refetch partitions in the background at the configured interval.
    RegisterRefresh {
        selector: PipelineSelector,
        partition_set: String,
        notify_tx: Sender<Event>,
    },
    Shutdown,
}

/// All events the engine can push back to UI views.
pub enum Event {
    PipelineFetched {
        snapshot: PipelineSnapshotOrError,
    },
    PartitionsFetched {
        partitions: Vec<Partition>,
        fetched_at: DateTime<Utc>,
    },
    /// Unified error event for all fetch failures.
    FetchError {
        context: String,
        message: String,
    },
}
