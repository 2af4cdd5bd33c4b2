use std::sync::mpsc::Sender;
use std::time::{Duration, SystemTime};

use crate::types::PipelineSelector;

use super::interface::Event;

/// What a background refresh refetches.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RefreshTarget {
    pub selector: PipelineSelector,
    pub partition_set: String,
}

struct RefreshEntry {
    target: RefreshTarget,
    interval: Duration,
    notify_tx: Sender<Event>,
    // Wall clock on purpose: Instant freezes during suspend and would delay
    // the first refresh after wake.
    last_fetch: Option<SystemTime>,
}

/// Tracks background refresh state per partition set.
pub struct RefreshScheduler {
    entries: Vec<RefreshEntry>,
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a target, replacing any existing registration for it.
    pub fn register(&mut self, target: RefreshTarget, interval: Duration, notify_tx: &Sender<Event>) {
        let last_fetch = self
            .entries
            .iter()
            .find(|e| e.target == target)
            .and_then(|e| e.last_fetch);
        self.entries.retain(|e| e.target != target);
        self.entries.push(RefreshEntry {
            target,
            interval,
            notify_tx: notify_tx.clone(),
            last_fetch,
        });
    }

    /// Record a successful fetch of `target`.
    pub fn mark_fetched(&mut self, target: &RefreshTarget) {
        let now = SystemTime::now();
        for entry in &mut self.entries {
            if &entry.target == target {
                entry.last_fetch = Some(now);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose refresh interval has elapsed since their last fetch.
    ///
    /// Entries that have never been fetched are skipped: the initial load is
    /// done on demand by the view; background refresh fires only afterwards.
    pub fn due_entries(&self) -> Vec<DueEntry> {
        let now = SystemTime::now();
        self.entries
            .iter()
            .filter(|e| {
                e.last_fetch
                    .is_some_and(|t| now.duration_since(t).unwrap_or(Duration::ZERO) >= e.interval)
            })
            .map(|e| DueEntry {
                target: e.target.clone(),
                notify_tx: e.notify_tx.clone(),
            })
            .collect()
    }
}

/// An entry that is due for background refresh.
pub struct DueEntry {
    pub target: RefreshTarget,
    pub notify_tx: Sender<Event>,
}
