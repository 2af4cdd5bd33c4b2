use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Step outcome taxonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepEventStatus {
    Success,
    Failure,
    Skipped,
    InProgress,
    #[serde(other)]
    Unknown,
}

// ---------------------------------------------------------------------------
// Run records (read-only, owned by the remote data source)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTag {
    pub key: String,
    pub value: String,
}

/// Per-step statistics reported for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    /// Step key, e.g. `"load_table"` or `"load_table.compute"`.
    pub step_key: String,
    pub status: Option<StepEventStatus>,
    /// Number of materialization events the step emitted.
    #[serde(default)]
    pub materializations: usize,
    /// Outcome of each expectation result, in emission order.
    #[serde(default)]
    pub expectation_results: Vec<bool>,
}

impl StepStats {
    pub fn expectations_passed(&self) -> usize {
        self.expectation_results.iter().filter(|ok| **ok).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    #[serde(default)]
    pub tags: Vec<RunTag>,
    /// Seconds since the Unix epoch; absent for runs that never started.
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub step_stats: Vec<StepStats>,
}

impl Run {
    /// Start time truncated to whole seconds, 0 when the run never started.
    #[allow(clippy::cast_possible_truncation)]
    pub fn start_unix(&self) -> i64 {
        self.start_time
            .filter(|t| t.is_finite() && *t > 0.0)
            .map_or(0, |t| t.trunc() as i64)
    }

    /// First step statistic recorded for `step_name`.
    ///
    /// A key matches when it equals the step name or extends it with a dotted
    /// suffix (`"step.compute"`, `"step.mapped[0]"`). The first match in list
    /// order wins.
    pub fn step_stats_for(&self, step_name: &str) -> Option<&StepStats> {
        self.step_stats
            .iter()
            .find(|stats| step_key_matches(&stats.step_key, step_name))
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// First eight characters of the run id, as shown in run lists.
    pub fn short_id(&self) -> &str {
        self.run_id
            .char_indices()
            .nth(8)
            .map_or(self.run_id.as_str(), |(end, _)| &self.run_id[..end])
    }
}

pub fn step_key_matches(step_key: &str, step_name: &str) -> bool {
    step_key
        .strip_prefix(step_name)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// A named unit of scheduled work and the runs launched for it.
///
/// Runs are kept in fetch order, which is not guaranteed to be chronological.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub name: String,
    #[serde(default)]
    pub runs: Vec<Run>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(key: &str, status: StepEventStatus) -> StepStats {
        StepStats {
            step_key: key.to_owned(),
            status: Some(status),
            materializations: 0,
            expectation_results: vec![],
        }
    }

    #[test]
    fn step_key_exact_and_dotted_prefix_match() {
        assert!(step_key_matches("load", "load"));
        assert!(step_key_matches("load.compute", "load"));
        assert!(!step_key_matches("load_table", "load"));
        assert!(!step_key_matches("lo", "load"));
    }

    #[test]
    fn first_matching_step_stats_wins() {
        let run = Run {
            run_id: "abc".to_owned(),
            tags: vec![],
            start_time: Some(10.0),
            step_stats: vec![
                stats("other", StepEventStatus::Success),
                stats("load.a", StepEventStatus::Failure),
                stats("load.b", StepEventStatus::Success),
            ],
        };
        let found = run.step_stats_for("load").map(|s| s.status);
        assert_eq!(found, Some(Some(StepEventStatus::Failure)));
    }

    #[test]
    fn start_unix_defaults_to_zero() {
        let mut run = Run {
            run_id: "abc".to_owned(),
            tags: vec![],
            start_time: None,
            step_stats: vec![],
        };
        assert_eq!(run.start_unix(), 0);
        run.start_time = Some(1_600_000_000.75);
        assert_eq!(run.start_unix(), 1_600_000_000);
    }

    #[test]
    fn short_id_truncates_long_ids() {
        let run = Run {
            run_id: "0123456789abcdef".to_owned(),
            tags: vec![],
            start_time: None,
            step_stats: vec![],
        };
        assert_eq!(run.short_id(), "01234567");
    }

    #[test]
    fn unknown_status_deserializes() {
        let s: StepEventStatus = serde_json::from_str("\"RETRY_REQUESTED\"").unwrap();
        assert_eq!(s, StepEventStatus::Unknown);
        let s: StepEventStatus = serde_json::from_str("\"IN_PROGRESS\"").unwrap();
        assert_eq!(s, StepEventStatus::InProgress);
    }
}
