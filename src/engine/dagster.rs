use std::sync::mpsc::Sender;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::types::AppConfig;
use crate::dagster::{DagsterClient, graphql};
use crate::types::PipelineSelector;

use super::interface::{Engine, EngineHandle, Event, Request};
use super::refresh::{DueEntry, RefreshScheduler, RefreshTarget};

/// The real Dagster backend engine.
pub struct DagsterEngine {
    config: AppConfig,
}

impl DagsterEngine {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

impl Engine for DagsterEngine {
    fn start(self) -> EngineHandle {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Request>();
        let handle = EngineHandle::new(tx);
        let spawned = std::thread::Builder::new()
            .name("dagster-engine".to_owned())
            .spawn(move || match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(self.run_loop(rx)),
                Err(e) => tracing::error!("engine: tokio runtime init failed: {e}"),
            });
        if let Err(e) = spawned {
            tracing::error!("engine: failed to spawn thread: {e}");
        }
        handle
    }
}

impl DagsterEngine {
    async fn run_loop(self, mut rx: UnboundedReceiver<Request>) {
        let client = match DagsterClient::new(&self.config.dagster) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("engine: {e:#}");
                // Answer every fetch with the construction error until shutdown.
                let message = format!("{e:#}");
                while let Some(req) = rx.recv().await {
                    match req {
                        Request::Shutdown => break,
                        Request::FetchPipeline { reply_tx, .. }
                        | Request::FetchPartitions { reply_tx, .. } => {
                            let _ = reply_tx.send(Event::FetchError {
                                context: "client".to_owned(),
                                message: message.clone(),
                            });
                        }
                        Request::RegisterRefresh { .. } => {}
                    }
                }
                return;
            }
        };
        let limit = self.config.dagster.partition_limit;
        let interval_mins = u64::from(self.config.dagster.refetch_interval_minutes);
        let refresh_interval = Duration::from_secs((interval_mins * 60).max(60));
        let mut scheduler = RefreshScheduler::new();

        let mut refresh_tick = tokio::time::interval(refresh_interval);
        // Consume the first immediate tick so refresh fires after one full interval.
        refresh_tick.tick().await;

        loop {
            tokio::select! {
                biased;
                maybe_req = rx.recv() => {
                    match maybe_req {
                        None | Some(Request::Shutdown) => {
                            tracing::debug!("engine: shutting down");
                            break;
                        }
                        Some(req) => {
                            handle_request(req, &client, limit, refresh_interval, &mut scheduler).await;
                        }
                    }
                }
                _ = refresh_tick.tick() => {
                    tick_refresh(&client, limit, &mut scheduler).await;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request dispatch
// ---------------------------------------------------------------------------

async fn handle_request(
    req: Request,
    client: &DagsterClient,
    limit: u32,
    refresh_interval: Duration,
    scheduler: &mut RefreshScheduler,
) {
    match req {
        Request::FetchPipeline { selector, reply_tx } => {
            tracing::debug!("engine: FetchPipeline {}", selector.display_name());
            match graphql::fetch_pipeline_snapshot(client, &selector).await {
                Ok(snapshot) => {
                    let _ = reply_tx.send(Event::PipelineFetched { snapshot });
                }
                Err(e) => send_error(&reply_tx, "pipeline", &e),
            }
        }
        Request::FetchPartitions {
            selector,
            partition_set,
            force,
            reply_tx,
        } => {
            tracing::debug!("engine: FetchPartitions {partition_set} force={force}");
            let cache = client.cache();
            let cache_ref = if force { None } else { Some(&cache) };
            match graphql::fetch_partitions(client, &selector, &partition_set, limit, cache_ref)
                .await
            {
                Ok(partitions) => {
                    scheduler.mark_fetched(&RefreshTarget {
                        selector,
                        partition_set,
                    });
                    tracing::debug!("engine: PartitionsFetched count={}", partitions.len());
                    let _ = reply_tx.send(Event::PartitionsFetched {
                        partitions,
                        fetched_at: Utc::now(),
                    });
                }
                Err(e) => send_error(&reply_tx, "partitions", &e),
            }
        }
        Request::RegisterRefresh {
            selector,
            partition_set,
            notify_tx,
        } => {
            scheduler.register(
                RefreshTarget {
                    selector,
                    partition_set,
                },
                refresh_interval,
                &notify_tx,
            );
        }
        Request::Shutdown => {}
    }
}

// ---------------------------------------------------------------------------
// Background refresh
// ---------------------------------------------------------------------------

async fn tick_refresh(client: &DagsterClient, limit: u32, scheduler: &mut RefreshScheduler) {
    for DueEntry { target, notify_tx } in scheduler.due_entries() {
        let RefreshTarget {
            selector,
            partition_set,
        } = &target;
        // Background refreshes always bypass the cache.
        match graphql::fetch_partitions(client, selector, partition_set, limit, None).await {
            Ok(partitions) => {
                scheduler.mark_fetched(&target);
                tracing::debug!(
                    "engine: refresh PartitionsFetched[{}] count={}",
                    describe(selector, partition_set),
                    partitions.len()
                );
                let _ = notify_tx.send(Event::PartitionsFetched {
                    partitions,
                    fetched_at: Utc::now(),
                });
            }
            Err(e) => {
                tracing::debug!(
                    "engine: refresh FetchPartitions[{}] error: {e:#}",
                    describe(selector, partition_set)
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn send_error(reply_tx: &Sender<Event>, context: &str, err: &anyhow::Error) {
    tracing::warn!("engine: {context} fetch failed: {err:#}");
    let _ = reply_tx.send(Event::FetchError {
        context: context.to_owned(),
        message: format!("{err:#}"),
    });
}

fn describe(selector: &PipelineSelector, partition_set: &str) -> String {
    format!("{}/{partition_set}", selector.display_name())
}
