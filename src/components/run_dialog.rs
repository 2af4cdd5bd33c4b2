use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::matrix::{PartitionColumn, StatusColor};
use crate::theme::ResolvedTheme;
use crate::types::Run;
use crate::util;

// ---------------------------------------------------------------------------
// Run dialog: runs of one partition, seen through one step
// ---------------------------------------------------------------------------

/// Runs in dialog order: newest first.
pub fn dialog_runs(column: &PartitionColumn) -> impl Iterator<Item = &Run> {
    column.runs.iter().rev()
}

pub struct RenderedRunRow {
    pub marker: &'static str,
    pub status: String,
    pub status_fg: Color,
    pub started: String,
    pub details: String,
    pub run_id: String,
    pub tags: String,
    pub is_selected: bool,
}

/// Pre-rendered dialog data (owned, 'static-safe).
pub struct RenderedRunDialog {
    pub title: String,
    pub rows: Vec<RenderedRunRow>,
    pub empty_message: Option<String>,
    pub title_fg: Color,
    pub item_fg: Color,
    pub faint_fg: Color,
    pub cursor_bg: Color,
    pub border_fg: Color,
}

pub struct RunDialogBuildConfig<'a> {
    pub column: &'a PartitionColumn,
    pub step: &'a str,
    pub cursor: usize,
    pub date_format: &'a str,
    /// Tag keys shown next to each run.
    pub tags: &'a [String],
    pub theme: &'a ResolvedTheme,
    pub depth: ColorDepth,
}

impl RenderedRunDialog {
    pub fn build(cfg: &RunDialogBuildConfig<'_>) -> Self {
        let theme = cfg.theme;
        let depth = cfg.depth;

        let rows: Vec<RenderedRunRow> = dialog_runs(cfg.column)
            .enumerate()
            .map(|(i, run)| {
                let stats = run.step_stats_for(cfg.step);
                let color = StatusColor::for_status(stats.and_then(|s| s.status));
                let details = stats.map_or_else(String::new, |s| {
                    let mut parts = Vec::new();
                    if s.materializations > 0 {
                        parts.push(format!("{} mat", s.materializations));
                    }
                    if !s.expectation_results.is_empty() {
                        parts.push(format!(
                            "{}/{} exp",
                            s.expectations_passed(),
                            s.expectation_results.len()
                        ));
                    }
                    parts.join("  ")
                });
                let tags = cfg
                    .tags
                    .iter()
                    .filter_map(|key| run.tag(key).map(|value| format!("{key}={value}")))
                    .collect::<Vec<_>>()
                    .join(" ");
                let is_selected = i == cfg.cursor;
                RenderedRunRow {
                    marker: if is_selected { "\u{25b6} " } else { "  " },
                    status: color.label().to_owned(),
                    status_fg: theme.status.color(color).to_crossterm_color(depth),
                    started: util::format_unix(run.start_unix(), cfg.date_format),
                    details,
                    run_id: run.short_id().to_owned(),
                    tags,
                    is_selected,
                }
            })
            .collect();

        let empty_message = rows
            .is_empty()
            .then(|| "No runs for this partition".to_owned());

        Self {
            title: format!("{} \u{00b7} {}", cfg.step, cfg.column.name),
            rows,
            empty_message,
            title_fg: theme.text_primary.to_crossterm_color(depth),
            item_fg: theme.text_secondary.to_crossterm_color(depth),
            faint_fg: theme.text_faint.to_crossterm_color(depth),
            cursor_bg: theme.bg_selected.to_crossterm_color(depth),
            border_fg: theme.border_primary.to_crossterm_color(depth),
        }
    }
}

// ---------------------------------------------------------------------------
// RunDialog component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct RunDialogProps {
    pub dialog: Option<RenderedRunDialog>,
    pub width: u16,
    pub height: u16,
}

#[component]
pub fn RunDialog(props: &mut RunDialogProps) -> impl Into<AnyElement<'static>> {
    let Some(dialog) = props.dialog.take() else {
        return element! { View }.into_any();
    };

    let width = u32::from(props.width);
    let height = u32::from(props.height);

    // Centered, ~70% width, height fits the runs.
    #[allow(clippy::cast_possible_truncation)]
    let content_height = (dialog.rows.len().max(1) as u32) + 4;
    let dialog_width = (width * 7 / 10).max(50).min(width.saturating_sub(4));
    let dialog_height = content_height.min(height.saturating_sub(2));
    let pad_left = (width.saturating_sub(dialog_width)) / 2;
    let pad_top = (height.saturating_sub(dialog_height)) / 2;

    let item_fg = dialog.item_fg;
    let faint_fg = dialog.faint_fg;
    let cursor_bg = dialog.cursor_bg;

    element! {
        View(
            width,
            height,
            position: Position::Absolute,
        ) {
            View(
                margin_left: pad_left,
                margin_top: pad_top,
                width: dialog_width,
                height: dialog_height,
                flex_direction: FlexDirection::Column,
                border_style: BorderStyle::Round,
                border_color: dialog.border_fg,
                background_color: Color::Reset,
                overflow: Overflow::Hidden,
            ) {
                View(
                    border_style: BorderStyle::Single,
                    border_edges: Edges::Bottom,
                    border_color: dialog.border_fg,
                    padding_left: 1,
                    padding_right: 1,
                ) {
                    Text(
                        content: dialog.title,
                        color: dialog.title_fg,
                        weight: Weight::Bold,
                        wrap: TextWrap::NoWrap,
                    )
                    View(flex_grow: 1.0)
                    Text(
                        content: "j/k o y Esc",
                        color: faint_fg,
                        wrap: TextWrap::NoWrap,
                    )
                }

                View(
                    flex_grow: 1.0,
                    flex_direction: FlexDirection::Column,
                    padding_left: 1,
                    padding_right: 1,
                    overflow: Overflow::Hidden,
                ) {
                    #(dialog.empty_message.into_iter().map(|msg| {
                        element! {
                            Text(content: msg, color: faint_fg)
                        }
                    }))
                    #(dialog.rows.into_iter().enumerate().map(|(i, row)| {
                        let bg = if row.is_selected { cursor_bg } else { Color::Reset };
                        element! {
                            View(key: i, background_color: bg) {
                                Text(content: row.marker, color: item_fg, wrap: TextWrap::NoWrap)
                                View(width: 24u32) {
                                    Text(content: row.status, color: row.status_fg, wrap: TextWrap::NoWrap)
                                }
                                View(width: 18u32) {
                                    Text(content: row.started, color: item_fg, wrap: TextWrap::NoWrap)
                                }
                                View(width: 10u32) {
                                    Text(content: row.run_id, color: item_fg, wrap: TextWrap::NoWrap)
                                }
                                View(width: 16u32) {
                                    Text(content: row.details, color: item_fg, wrap: TextWrap::NoWrap)
                                }
                                Text(content: row.tags, color: faint_fg, wrap: TextWrap::NoWrap)
                            }
                        }
                    }))
                }
            }
        }
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RunTag, StepEventStatus, StepStats};
    use crate::views::default_theme;

    fn run(id: &str, start: f64, stats: Vec<StepStats>) -> Run {
        Run {
            run_id: id.to_owned(),
            tags: vec![RunTag {
                key: "dagster/backfill".to_owned(),
                value: "bf1".to_owned(),
            }],
            start_time: Some(start),
            step_stats: stats,
        }
    }

    fn stats(key: &str, status: StepEventStatus) -> StepStats {
        StepStats {
            step_key: key.to_owned(),
            status: Some(status),
            materializations: 2,
            expectation_results: vec![true, false],
        }
    }

    fn column() -> PartitionColumn {
        PartitionColumn {
            name: "2024-01-05".to_owned(),
            runs: vec![
                run("old-run-id-1", 100.0, vec![stats("load.compute", StepEventStatus::Failure)]),
                run("new-run-id-2", 200.0, vec![
                    stats("load.compute", StepEventStatus::Success),
                    stats("load.other", StepEventStatus::Failure),
                ]),
            ],
            steps: vec![],
        }
    }

    fn build(column: &PartitionColumn, cursor: usize) -> RenderedRunDialog {
        let theme = default_theme();
        RenderedRunDialog::build(&RunDialogBuildConfig {
            column,
            step: "load",
            cursor,
            date_format: "%Y",
            tags: &["dagster/backfill".to_owned()],
            theme: &theme,
            depth: ColorDepth::TrueColor,
        })
    }

    #[test]
    fn newest_run_first_with_first_matching_record() {
        let c = column();
        let d = build(&c, 0);
        assert_eq!(d.rows.len(), 2);
        assert_eq!(d.rows[0].run_id, "new-run-");
        assert_eq!(d.rows[0].status, "Succeeded");
        assert_eq!(d.rows[1].status, "Failed");
        assert_eq!(d.rows[0].details, "2 mat  1/2 exp");
        assert_eq!(d.rows[0].tags, "dagster/backfill=bf1");
    }

    #[test]
    fn cursor_maps_to_same_run_as_rows() {
        let c = column();
        let ids: Vec<&str> = dialog_runs(&c).map(|r| r.run_id.as_str()).collect();
        assert_eq!(ids.get(1).copied(), Some("old-run-id-1"));
        assert_eq!(ids.len(), 2);
        assert!(build(&c, 1).rows[1].is_selected);
    }

    #[test]
    fn empty_partition_has_message() {
        let c = PartitionColumn {
            name: "p1".to_owned(),
            runs: vec![],
            steps: vec![],
        };
        let d = build(&c, 0);
        assert!(d.rows.is_empty());
        assert!(d.empty_message.is_some());
    }
}
