use partition_matrix::matrix::{
    MatrixData, SortKey, StepGraph, ViewportRequest, build_for_query, render_list, sort_rows,
    visible_window,
};
use partition_matrix::types::{
    Partition, PipelineSnapshot, Run, StepEventStatus, StepHandle, StepStats,
};
use partition_matrix::view_state::DisplayOptions;

use StepEventStatus::{Failure, Success};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// extract -> transform -> load, extract -> audit.
fn graph() -> StepGraph {
    let step = |name: &str, deps: &[&str]| StepHandle {
        name: name.to_owned(),
        depends_on: deps.iter().map(|d| (*d).to_owned()).collect(),
        depended_by: vec![],
    };
    StepGraph::from_snapshot(&PipelineSnapshot {
        steps: vec![
            step("extract", &[]),
            step("transform", &["extract"]),
            step("load", &["transform"]),
            step("audit", &["extract"]),
        ],
    })
}

fn run(id: &str, start: f64, stats: &[(&str, StepEventStatus)]) -> Run {
    Run {
        run_id: id.to_owned(),
        tags: vec![],
        start_time: Some(start),
        step_stats: stats
            .iter()
            .map(|(key, status)| StepStats {
                step_key: format!("{key}.compute"),
                status: Some(*status),
                materializations: 0,
                expectation_results: vec![],
            })
            .collect(),
    }
}

fn partitions() -> Vec<Partition> {
    vec![
        Partition {
            name: "2024-01-01".to_owned(),
            // Fetch order is newest first here; the builder sorts by start time.
            runs: vec![
                run(
                    "r2",
                    200.0,
                    &[
                        ("extract", Success),
                        ("transform", Success),
                        ("load", Success),
                        ("audit", Success),
                    ],
                ),
                run("r1", 100.0, &[("extract", Success), ("transform", Failure)]),
            ],
        },
        Partition {
            name: "2024-01-02".to_owned(),
            runs: vec![run(
                "r3",
                300.0,
                &[
                    ("extract", Success),
                    ("transform", Success),
                    ("load", Failure),
                    ("audit", Success),
                ],
            )],
        },
        Partition {
            name: "2024-01-03".to_owned(),
            runs: vec![],
        },
    ]
}

fn build(options: DisplayOptions) -> MatrixData {
    build_for_query(&partitions(), Some(&graph()), "", &options).expect("graph is loaded")
}

fn row_names(data: &MatrixData) -> Vec<&str> {
    data.rows.iter().map(|r| r.name.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[test]
fn missing_graph_is_not_ready() {
    let data = build_for_query(&partitions(), None, "", &DisplayOptions::default());
    assert!(data.is_none());
}

#[test]
fn rows_follow_graph_order_with_depth() {
    let data = build(DisplayOptions::default());
    assert_eq!(row_names(&data), ["extract", "transform", "load", "audit"]);
    let depths: Vec<usize> = data.rows.iter().map(|r| r.depth).collect();
    assert_eq!(depths, [0, 1, 2, 1]);
}

#[test]
fn final_only_colors_equal_collapsed_history() {
    for show_previous in [false, true] {
        let data = build(DisplayOptions {
            show_previous,
            ..DisplayOptions::default()
        });
        for column in &data.columns {
            for cell in &column.steps {
                if show_previous {
                    assert_eq!(cell.color, cell.history);
                } else {
                    assert_eq!(cell.color, cell.history.final_color());
                }
            }
        }
    }
}

#[test]
fn failure_then_success_shows_history_only_when_asked() {
    use partition_matrix::matrix::StatusColor;

    let final_only = build(DisplayOptions::default());
    assert_eq!(final_only.columns[0].steps[1].color, StatusColor::Success);

    let with_history = build(DisplayOptions {
        show_previous: true,
        ..DisplayOptions::default()
    });
    assert_eq!(
        with_history.columns[0].steps[1].color,
        StatusColor::FailureSuccess
    );
}

#[test]
fn percentages_count_only_partitions_with_runs() {
    let data = build(DisplayOptions::default());
    let percents: Vec<(u8, u8)> = data
        .rows
        .iter()
        .map(|r| (r.total_failure_percent, r.final_failure_percent))
        .collect();
    // transform failed once in one of two partitions but recovered; load's
    // latest run failed in one of two.
    assert_eq!(percents, [(0, 0), (50, 0), (50, 50), (0, 0)]);
}

#[test]
fn zero_partitions_give_zero_percentages() {
    let data = build_for_query(&[], Some(&graph()), "", &DisplayOptions::default())
        .expect("graph is loaded");
    assert!(data.columns.is_empty());
    assert_eq!(data.rows.len(), 4);
    assert!(data
        .rows
        .iter()
        .all(|r| r.total_failure_percent == 0 && r.final_failure_percent == 0));
}

#[test]
fn partition_without_runs_is_empty() {
    let data = build(DisplayOptions::default());
    let column = &data.columns[2];
    assert_eq!(column.name, "2024-01-03");
    assert!(column.is_empty());
    assert_eq!(column.runs.len(), 0);
    assert!(column.steps.iter().all(|c| c.color.is_empty() && c.unix == 0));
}

#[test]
fn cell_time_is_latest_success() {
    let data = build(DisplayOptions::default());
    // extract succeeded in both runs of the first partition; r2 is newer.
    assert_eq!(data.columns[0].steps[0].unix, 200);
    // transform failed in r1 and succeeded in r2.
    assert_eq!(data.columns[0].steps[1].unix, 200);
    assert_eq!(data.columns[1].steps[2].unix, 300);
}

#[test]
fn failures_and_gaps_filter_is_reversible() {
    let filtered = build(DisplayOptions {
        show_failures_and_gaps_only: true,
        ..DisplayOptions::default()
    });
    // The empty 2024-01-03 partition is a gap for every step.
    assert_eq!(row_names(&filtered), ["extract", "transform", "load", "audit"]);

    let all = partitions();
    let ran = &all[..2];
    let filtered = build_for_query(ran, Some(&graph()), "", &DisplayOptions {
        show_failures_and_gaps_only: true,
        ..DisplayOptions::default()
    })
    .expect("graph is loaded");
    assert_eq!(row_names(&filtered), ["transform", "load"]);
    assert!(filtered.columns.iter().all(|c| c.steps.len() == 2));

    let restored = build_for_query(ran, Some(&graph()), "", &DisplayOptions::default())
        .expect("graph is loaded");
    assert_eq!(row_names(&restored), ["extract", "transform", "load", "audit"]);
}

#[test]
fn step_query_selects_subgraph() {
    let data = build_for_query(
        &partitions(),
        Some(&graph()),
        "transform+",
        &DisplayOptions::default(),
    )
    .expect("graph is loaded");
    assert_eq!(row_names(&data), ["transform", "load"]);
    // Depth comes from the full graph.
    assert_eq!(data.rows[0].depth, 1);
}

#[test]
fn unknown_step_query_yields_empty_shell() {
    let data = build_for_query(
        &partitions(),
        Some(&graph()),
        "nope",
        &DisplayOptions::default(),
    )
    .expect("graph is loaded");
    assert!(data.rows.is_empty());
    assert_eq!(data.columns.len(), 3);
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[test]
fn sort_is_idempotent() {
    let mut once = build(DisplayOptions::default());
    sort_rows(&mut once, SortKey::TotalDesc);
    let mut twice = once.clone();
    sort_rows(&mut twice, SortKey::TotalDesc);
    assert_eq!(once, twice);
    assert_eq!(row_names(&once), ["transform", "load", "extract", "audit"]);
}

#[test]
fn header_toggle_round_trip_restores_descending() {
    let key = SortKey::None.toggle_total();
    assert_eq!(key, SortKey::TotalDesc);

    let mut first = build(DisplayOptions::default());
    sort_rows(&mut first, key);

    let mut data = build(DisplayOptions::default());
    let asc = key.toggle_total();
    assert_eq!(asc, SortKey::TotalAsc);
    sort_rows(&mut data, asc);
    assert_eq!(row_names(&data), ["extract", "audit", "transform", "load"]);

    let desc = asc.toggle_total();
    sort_rows(&mut data, desc);
    assert_eq!(data, first);
}

#[test]
fn cells_move_with_their_rows() {
    let mut data = build(DisplayOptions::default());
    sort_rows(&mut data, SortKey::FinalDesc);
    assert_eq!(data.rows[0].name, "load");
    for column in &data.columns {
        let names: Vec<&str> = column.steps.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, row_names(&data));
    }

    sort_rows(&mut data, SortKey::None);
    assert_eq!(row_names(&data), ["extract", "transform", "load", "audit"]);
}

// ---------------------------------------------------------------------------
// Viewport windowing
// ---------------------------------------------------------------------------

#[test]
fn window_matches_worked_example() {
    let request = ViewportRequest {
        scroll_offset: 500,
        visible_width: 800,
        column_width: 23,
        overscan: 150,
    };
    let window = visible_window(request);
    assert_eq!((window.start, window.count), (15, 48));
    // Columns 15..63 span pixels 345..1449.
    assert!(window.start * 23 <= 500);
    assert!((window.start + window.count) * 23 >= 1300);
}

#[test]
fn window_covers_viewport_at_every_offset() {
    // Holds whenever the overscan is at least one column wide.
    for column_width in [1, 3, 23] {
        for visible_width in [0, 10, 799] {
            for scroll_offset in (0..2000).step_by(7) {
                let window = visible_window(ViewportRequest {
                    scroll_offset,
                    visible_width,
                    column_width,
                    overscan: column_width,
                });
                assert!(window.start * column_width <= scroll_offset);
                assert!(
                    (window.start + window.count) * column_width >= scroll_offset + visible_width
                );
            }
        }
    }
}

#[test]
fn render_list_is_clamped_to_data() {
    let request = ViewportRequest {
        scroll_offset: 0,
        visible_width: 30,
        column_width: 3,
        overscan: 9,
    };
    let columns = render_list(request, 4);
    let indices: Vec<usize> = columns.iter().map(|c| c.index).collect();
    assert_eq!(indices, [0, 1, 2, 3]);
    assert_eq!(columns[1].x, 3);
    assert!(render_list(request, 0).is_empty());
}
