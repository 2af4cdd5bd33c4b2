use crate::types::{Partition, Run, StepEventStatus};
use crate::view_state::DisplayOptions;

use super::layout::{LaidOutStep, StepGraph};
use super::selection::select_steps;
use super::status::StatusColor;

// ---------------------------------------------------------------------------
// Derived matrix
// ---------------------------------------------------------------------------

/// One (step, partition) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixCell {
    pub name: String,
    /// Color to draw, already collapsed unless previous states are shown.
    pub color: StatusColor,
    /// Full-history color, independent of display options.
    pub history: StatusColor,
    /// Representative start time in Unix seconds, 0 when no run touched the step.
    pub unix: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRow {
    pub name: String,
    /// Indentation level from the step graph layout.
    pub depth: usize,
    /// Position in graph order; the tie-breaker for every sort.
    pub graph_index: usize,
    /// Share of partitions (with runs) where the step failed at least once.
    pub total_failure_percent: u8,
    /// Share of partitions (with runs) where the step's latest outcome is a failure.
    pub final_failure_percent: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartitionColumn {
    pub name: String,
    /// Runs sorted by start time, oldest first.
    pub runs: Vec<Run>,
    /// One cell per row of [`MatrixData::rows`], in the same order.
    pub steps: Vec<MatrixCell>,
}

impl PartitionColumn {
    /// A partition without runs renders as empty, non-interactive cells.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatrixData {
    pub rows: Vec<StepRow>,
    pub columns: Vec<PartitionColumn>,
}

impl MatrixData {
    pub fn column_index(&self, partition: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == partition)
    }

    pub fn cell(&self, column: usize, row: usize) -> Option<&MatrixCell> {
        self.columns.get(column).and_then(|c| c.steps.get(row))
    }

    /// Oldest and newest non-zero cell timestamps.
    pub fn unix_range(&self) -> Option<(i64, i64)> {
        self.columns
            .iter()
            .flat_map(|c| c.steps.iter())
            .map(|cell| cell.unix)
            .filter(|&unix| unix > 0)
            .fold(None, |acc, unix| match acc {
                None => Some((unix, unix)),
                Some((lo, hi)) => Some((lo.min(unix), hi.max(unix))),
            })
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Status of `step` in each run, oldest run first.
fn step_history(runs: &[Run], step: &str) -> Vec<Option<StepEventStatus>> {
    runs.iter()
        .map(|run| run.step_stats_for(step).and_then(|s| s.status))
        .collect()
}

/// Start time of the latest run that succeeded at `step`, falling back to the
/// latest run with any record for it.
fn representative_unix(runs: &[Run], step: &str) -> i64 {
    let latest = |pred: &dyn Fn(&Run) -> bool| runs.iter().rev().find(|r| pred(r));
    latest(&|r| {
        r.step_stats_for(step)
            .is_some_and(|s| s.status == Some(StepEventStatus::Success))
    })
    .or_else(|| latest(&|r| r.step_stats_for(step).is_some()))
    .map_or(0, Run::start_unix)
}

fn percent(count: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (count * 100 + total / 2) / total;
    u8::try_from(pct.min(100)).unwrap_or(100)
}

/// Derive rows and columns for the laid-out steps.
///
/// Returns `None` while the step layout is not available; callers render a
/// placeholder instead of the grid.
pub fn build_matrix(
    partitions: &[Partition],
    layout: Option<&[LaidOutStep]>,
    options: &DisplayOptions,
) -> Option<MatrixData> {
    let layout = layout?;

    let mut columns: Vec<PartitionColumn> = partitions
        .iter()
        .map(|partition| {
            let mut runs = partition.runs.clone();
            runs.sort_by_key(Run::start_unix);
            let steps = layout
                .iter()
                .map(|step| {
                    let history = StatusColor::from_history(&step_history(&runs, &step.name), true);
                    MatrixCell {
                        name: step.name.clone(),
                        color: if options.show_previous {
                            history
                        } else {
                            history.final_color()
                        },
                        history,
                        unix: representative_unix(&runs, &step.name),
                    }
                })
                .collect();
            PartitionColumn {
                name: partition.name.clone(),
                runs,
                steps,
            }
        })
        .collect();

    let with_runs = columns.iter().filter(|c| !c.is_empty()).count();

    let mut rows: Vec<StepRow> = layout
        .iter()
        .enumerate()
        .map(|(idx, step)| {
            let mut total = 0;
            let mut last = 0;
            for column in columns.iter().filter(|c| !c.is_empty()) {
                let failed_any = column.runs.iter().any(|run| {
                    run.step_stats_for(&step.name)
                        .is_some_and(|s| s.status == Some(StepEventStatus::Failure))
                });
                if failed_any {
                    total += 1;
                }
                if column.steps[idx].history.final_color() == StatusColor::Failure {
                    last += 1;
                }
            }
            StepRow {
                name: step.name.clone(),
                depth: step.depth,
                graph_index: idx,
                total_failure_percent: percent(total, with_runs),
                final_failure_percent: percent(last, with_runs),
            }
        })
        .collect();

    // A partition without runs leaves a gap, so its row stays.
    if options.show_failures_and_gaps_only {
        let keep: Vec<bool> = (0..rows.len())
            .map(|idx| {
                !columns
                    .iter()
                    .all(|c| c.steps[idx].history.is_clean_success())
            })
            .collect();
        let mut flags = keep.iter();
        rows.retain(|_| flags.next().copied().unwrap_or(true));
        for column in &mut columns {
            let mut flags = keep.iter();
            column.steps.retain(|_| flags.next().copied().unwrap_or(true));
        }
    }

    Some(MatrixData { rows, columns })
}

/// Resolve `step_query` against `graph`, lay the result out and build the matrix.
pub fn build_for_query(
    partitions: &[Partition],
    graph: Option<&StepGraph>,
    step_query: &str,
    options: &DisplayOptions,
) -> Option<MatrixData> {
    let graph = graph?;
    let selected = select_steps(graph, step_query);
    let layout = graph.layout(&selected);
    build_matrix(partitions, Some(&layout), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StepStats;

    fn run(id: &str, start: f64, stats: &[(&str, StepEventStatus)]) -> Run {
        Run {
            run_id: id.to_owned(),
            tags: vec![],
            start_time: Some(start),
            step_stats: stats
                .iter()
                .map(|(key, status)| StepStats {
                    step_key: (*key).to_owned(),
                    status: Some(*status),
                    materializations: 0,
                    expectation_results: vec![],
                })
                .collect(),
        }
    }

    fn layout(names: &[&str]) -> Vec<LaidOutStep> {
        names
            .iter()
            .map(|n| LaidOutStep {
                name: (*n).to_owned(),
                depth: 0,
            })
            .collect()
    }

    #[test]
    fn missing_layout_is_not_ready() {
        assert!(build_matrix(&[], None, &DisplayOptions::default()).is_none());
    }

    #[test]
    fn zero_partitions_give_zero_percent() {
        let data = build_matrix(&[], Some(&layout(&["a"])), &DisplayOptions::default()).unwrap();
        assert_eq!(data.rows.len(), 1);
        assert_eq!(data.rows[0].total_failure_percent, 0);
        assert!(data.columns.is_empty());
    }

    #[test]
    fn runs_are_sorted_before_deriving_colors() {
        // Fetch order is newest first; the success is the latest run.
        let partition = Partition {
            name: "p".to_owned(),
            runs: vec![
                run("new", 200.0, &[("a", StepEventStatus::Success)]),
                run("old", 100.0, &[("a", StepEventStatus::Failure)]),
            ],
        };
        let opts = DisplayOptions {
            show_previous: true,
            ..DisplayOptions::default()
        };
        let data = build_matrix(&[partition], Some(&layout(&["a"])), &opts).unwrap();
        let cell = &data.columns[0].steps[0];
        assert_eq!(cell.color, StatusColor::FailureSuccess);
        assert_eq!(cell.unix, 200);
        assert_eq!(data.columns[0].runs[0].run_id, "old");
        assert_eq!(data.rows[0].total_failure_percent, 100);
        assert_eq!(data.rows[0].final_failure_percent, 0);
    }

    #[test]
    fn unix_falls_back_to_latest_record() {
        let partition = Partition {
            name: "p".to_owned(),
            runs: vec![
                run("r1", 100.0, &[("a", StepEventStatus::Failure)]),
                run("r2", 150.0, &[("a.compute", StepEventStatus::Skipped)]),
                run("r3", 300.0, &[]),
            ],
        };
        let data =
            build_matrix(&[partition], Some(&layout(&["a"])), &DisplayOptions::default()).unwrap();
        assert_eq!(data.columns[0].steps[0].unix, 150);
    }

    #[test]
    fn percentages_ignore_partitions_without_runs() {
        let partitions = vec![
            Partition {
                name: "p1".to_owned(),
                runs: vec![run("r1", 1.0, &[("a", StepEventStatus::Failure)])],
            },
            Partition {
                name: "p2".to_owned(),
                runs: vec![run("r2", 2.0, &[("a", StepEventStatus::Success)])],
            },
            Partition {
                name: "p3".to_owned(),
                runs: vec![run("r3", 3.0, &[("a", StepEventStatus::Success)])],
            },
            Partition {
                name: "empty".to_owned(),
                runs: vec![],
            },
        ];
        let data =
            build_matrix(&partitions, Some(&layout(&["a"])), &DisplayOptions::default()).unwrap();
        assert_eq!(data.rows[0].total_failure_percent, 33);
        assert_eq!(data.rows[0].final_failure_percent, 33);
        assert!(data.columns[3].is_empty());
        assert_eq!(data.columns[3].steps[0].unix, 0);
    }

    #[test]
    fn empty_partition_keeps_row_under_failures_filter() {
        let opts = DisplayOptions {
            show_failures_and_gaps_only: true,
            ..DisplayOptions::default()
        };
        let ran = Partition {
            name: "p1".to_owned(),
            runs: vec![run("r1", 1.0, &[("a", StepEventStatus::Success)])],
        };
        let empty = Partition {
            name: "p2".to_owned(),
            runs: vec![],
        };

        let data = build_matrix(&[ran.clone()], Some(&layout(&["a"])), &opts).unwrap();
        assert!(data.rows.is_empty());

        let data = build_matrix(&[ran, empty], Some(&layout(&["a"])), &opts).unwrap();
        assert_eq!(data.rows.len(), 1);
        assert!(data.columns[1].steps[0].history.is_gap());
        assert_eq!(data.columns[1].steps[0].unix, 0);
    }

    #[test]
    fn unix_range_skips_empty_cells() {
        let partitions = vec![
            Partition {
                name: "p1".to_owned(),
                runs: vec![run("r1", 50.0, &[("a", StepEventStatus::Success)])],
            },
            Partition {
                name: "p2".to_owned(),
                runs: vec![run("r2", 90.0, &[("a", StepEventStatus::Success)])],
            },
        ];
        let data =
            build_matrix(&partitions, Some(&layout(&["a", "b"])), &DisplayOptions::default())
                .unwrap();
        assert_eq!(data.unix_range(), Some((50, 90)));
    }
}
