use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::components::scrollbar::{Orientation, ScrollInfo, Scrollbar};
use crate::matrix::{
    AgeThreshold, MatrixData, SortKey, ViewportRequest, cell_opacity, render_list,
};
use crate::theme::ResolvedTheme;
use crate::util;
use crate::view_state::DisplayOptions;

/// Width of the Total% and Final% label columns.
const PERCENT_WIDTH: usize = 8;
/// Rows used for the vertical partition names above the body.
pub const HEADER_ROWS: usize = 5;
/// Rows below the body: run counts and the horizontal position track.
pub const FOOTER_ROWS: usize = 2;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Horizontal split of the grid into the sticky label region and the
/// scrollable body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    pub label_width: usize,
    pub body_width: usize,
    pub column_width: usize,
}

impl GridGeometry {
    pub fn new(total_width: u16, label_width: u16, column_width: u16) -> Self {
        let total = usize::from(total_width);
        // Two padding cells plus the vertical scrollbar.
        let chrome = 3;
        let label_width = usize::from(label_width).min(total.saturating_sub(chrome));
        let body_width = total.saturating_sub(label_width + 2 * PERCENT_WIDTH + chrome);
        Self {
            label_width,
            body_width,
            column_width: usize::from(column_width.max(1)),
        }
    }

    /// Number of whole columns that fit in the body.
    pub fn visible_columns(&self) -> usize {
        (self.body_width / self.column_width).max(1)
    }
}

// ---------------------------------------------------------------------------
// Pre-rendered grid (all owned)
// ---------------------------------------------------------------------------

pub struct GridSpan {
    pub text: String,
    pub fg: Color,
    pub bg: Option<Color>,
    pub weight: Weight,
}

impl GridSpan {
    fn new(text: impl Into<String>, fg: Color) -> Self {
        Self {
            text: text.into(),
            fg,
            bg: None,
            weight: Weight::Normal,
        }
    }

    fn bg(mut self, bg: Option<Color>) -> Self {
        self.bg = bg;
        self
    }

    fn bold(mut self, bold: bool) -> Self {
        if bold {
            self.weight = Weight::Bold;
        }
        self
    }
}

pub struct GridLine {
    pub key: usize,
    pub spans: Vec<GridSpan>,
}

pub struct RenderedMatrix {
    pub header: Vec<GridLine>,
    pub body: Vec<GridLine>,
    pub footer: Vec<GridLine>,
    pub row_scroll: ScrollInfo,
    pub column_scroll: ScrollInfo,
    pub body_height: u32,
    pub body_width: u32,
    pub empty_message: Option<String>,
    pub faint_fg: Color,
    pub thumb_fg: Color,
}

/// Configuration for building a `RenderedMatrix`.
pub struct MatrixBuildConfig<'a> {
    pub data: &'a MatrixData,
    pub sort: SortKey,
    pub options: DisplayOptions,
    pub age_threshold: AgeThreshold,
    /// Keyboard cursor as `(column, row)`; doubles as the hover highlight.
    pub cursor: Option<(usize, usize)>,
    /// Horizontal scroll offset in terminal cells.
    pub scroll_offset: usize,
    pub row_offset: usize,
    pub visible_rows: usize,
    pub geometry: GridGeometry,
    /// Overscan margin in terminal cells.
    pub overscan: usize,
    pub theme: &'a ResolvedTheme,
    pub depth: ColorDepth,
}

impl RenderedMatrix {
    #[allow(clippy::too_many_lines)]
    pub fn build(cfg: &MatrixBuildConfig<'_>) -> Self {
        let data = cfg.data;
        let theme = cfg.theme;
        let depth = cfg.depth;
        let geo = cfg.geometry;
        let w = geo.column_width;

        let primary_fg = theme.text_primary.to_crossterm_color(depth);
        let secondary_fg = theme.text_secondary.to_crossterm_color(depth);
        let faint_fg = theme.text_faint.to_crossterm_color(depth);
        let warning_fg = theme.text_warning.to_crossterm_color(depth);
        let error_fg = theme.text_error.to_crossterm_color(depth);
        let selected_bg = theme.bg_selected.to_crossterm_color(depth);

        let (cursor_col, cursor_row) = cfg.cursor.unzip();

        // Columns are laid out edge to edge, so only overscan columns can be
        // partly outside the body; a terminal cannot draw half a column.
        let request = ViewportRequest {
            scroll_offset: cfg.scroll_offset,
            visible_width: geo.body_width,
            column_width: w,
            overscan: cfg.overscan,
        };
        let body_width = i64::try_from(geo.body_width).unwrap_or(i64::MAX);
        let col_width = i64::try_from(w).unwrap_or(i64::MAX);
        let drawn: Vec<usize> = render_list(request, data.columns.len())
            .into_iter()
            .filter(|c| c.x >= 0 && c.x + col_width <= body_width)
            .map(|c| c.index)
            .collect();

        let column_bg = |index: usize| (cursor_col == Some(index)).then_some(selected_bg);

        // Header: partition names written vertically, label headers on the
        // last row.
        let mut header = Vec::with_capacity(HEADER_ROWS);
        let vertical: Vec<Vec<char>> = drawn
            .iter()
            .map(|&i| vertical_label(&data.columns[i].name, HEADER_ROWS))
            .collect();
        for r in 0..HEADER_ROWS {
            let mut spans = Vec::new();
            if r + 1 == HEADER_ROWS {
                spans.push(GridSpan::new(util::fit_to_width("Step", geo.label_width), secondary_fg).bold(true));
                spans.push(GridSpan::new(percent_header("Total", cfg.sort.total_arrow()), secondary_fg).bold(true));
                spans.push(GridSpan::new(percent_header("Final", cfg.sort.final_arrow()), secondary_fg).bold(true));
            } else {
                spans.push(GridSpan::new(" ".repeat(geo.label_width + 2 * PERCENT_WIDTH), faint_fg));
            }
            for (&index, chars) in drawn.iter().zip(&vertical) {
                let fg = if cursor_col == Some(index) { primary_fg } else { faint_fg };
                spans.push(
                    GridSpan::new(center(chars[r], w), fg)
                        .bg(column_bg(index))
                        .bold(cursor_col == Some(index)),
                );
            }
            header.push(GridLine { key: r, spans });
        }

        // Body: one line per visible step row.
        let unix_range = data.unix_range();
        let threshold = cfg.age_threshold.value(unix_range);
        let (min_unix, max_unix) = unix_range.unwrap_or((0, 0));
        let row_end = (cfg.row_offset + cfg.visible_rows).min(data.rows.len());
        let row_start = cfg.row_offset.min(row_end);
        let body: Vec<GridLine> = (row_start..row_end)
            .map(|ri| {
                let row = &data.rows[ri];
                let is_cursor_row = cursor_row == Some(ri);
                let row_bg = is_cursor_row.then_some(selected_bg);
                let indent = "  ".repeat(row.depth);
                let mut spans = vec![
                    GridSpan::new(
                        util::fit_to_width(&format!("{indent}{}", row.name), geo.label_width),
                        primary_fg,
                    )
                    .bg(row_bg)
                    .bold(is_cursor_row),
                    GridSpan::new(
                        percent_cell(row.total_failure_percent),
                        percent_fg(row.total_failure_percent, warning_fg, faint_fg),
                    )
                    .bg(row_bg),
                    GridSpan::new(
                        percent_cell(row.final_failure_percent),
                        percent_fg(row.final_failure_percent, error_fg, faint_fg),
                    )
                    .bg(row_bg),
                ];
                for &ci in &drawn {
                    let column = &data.columns[ci];
                    let is_cursor = is_cursor_row && cursor_col == Some(ci);
                    let bg = column_bg(ci).or(row_bg);
                    if column.is_empty() {
                        spans.push(GridSpan::new(center('·', w), faint_fg).bg(bg));
                        continue;
                    }
                    let Some(cell) = column.steps.get(ri) else {
                        spans.push(GridSpan::new(" ".repeat(w), faint_fg).bg(bg));
                        continue;
                    };
                    let mut color = theme.status.color(cell.color);
                    if cfg.options.colorize_by_age {
                        let opacity = cell_opacity(cell.unix, threshold, min_unix, max_unix);
                        color = color.blend(theme.bg_base, opacity);
                    }
                    spans.push(
                        GridSpan::new(cell_glyph(w, is_cursor), color.to_crossterm_color(depth))
                            .bg(bg),
                    );
                }
                GridLine { key: ri, spans }
            })
            .collect();

        // Footer: run counts, then the horizontal scroll track.
        let mut count_spans = vec![
            GridSpan::new(util::fit_to_width("Runs", geo.label_width), secondary_fg),
            GridSpan::new(" ".repeat(2 * PERCENT_WIDTH), faint_fg),
        ];
        for &ci in &drawn {
            let runs = data.columns[ci].runs.len();
            let fg = if runs == 0 { faint_fg } else { secondary_fg };
            count_spans.push(GridSpan::new(count_label(runs, w), fg).bg(column_bg(ci)));
        }

        let total_columns = data.columns.len();
        let visible_columns = geo.visible_columns();
        let first_drawn = drawn.first().copied().unwrap_or(0);
        let column_scroll = ScrollInfo {
            scroll_offset: first_drawn,
            visible_count: visible_columns,
            total_count: total_columns,
        };
        let position = match cursor_col.and_then(|ci| data.columns.get(ci)) {
            Some(column) => format!(
                "{}  ({} run{})",
                column.name,
                column.runs.len(),
                if column.runs.len() == 1 { "" } else { "s" }
            ),
            None => String::new(),
        };
        let footer = vec![
            GridLine {
                key: 0,
                spans: count_spans,
            },
            GridLine {
                key: 1,
                spans: vec![GridSpan::new(
                    util::fit_to_width(&position, geo.label_width + 2 * PERCENT_WIDTH),
                    primary_fg,
                )],
            },
        ];

        let empty_message = if data.rows.is_empty() {
            Some("No steps to show".to_owned())
        } else if total_columns == 0 {
            Some("No partitions".to_owned())
        } else {
            None
        };

        #[allow(clippy::cast_possible_truncation)]
        let (body_height, body_width) = (cfg.visible_rows as u32, geo.body_width as u32);

        Self {
            header,
            body,
            footer,
            row_scroll: ScrollInfo {
                scroll_offset: cfg.row_offset,
                visible_count: cfg.visible_rows,
                total_count: data.rows.len(),
            },
            column_scroll,
            body_height,
            body_width,
            empty_message,
            faint_fg,
            thumb_fg: secondary_fg,
        }
    }
}

fn percent_header(label: &str, arrow: &str) -> String {
    format!("{:>7} ", format!("{label}{arrow}"))
}

fn percent_cell(percent: u8) -> String {
    format!("{percent:>6}% ")
}

fn percent_fg(percent: u8, hot: Color, cold: Color) -> Color {
    if percent > 0 { hot } else { cold }
}

/// Filled block with a one-cell gap, bracketed when under the cursor.
fn cell_glyph(width: usize, is_cursor: bool) -> String {
    match width {
        0 => String::new(),
        1 => "█".to_owned(),
        2 if is_cursor => "▐▌".to_owned(),
        w if is_cursor => format!("[{}]", "█".repeat(w - 2)),
        w => format!("{} ", "█".repeat(w - 1)),
    }
}

fn center(ch: char, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let left = (width - 1) / 2;
    let mut s = " ".repeat(left);
    s.push(ch);
    s.push_str(&" ".repeat(width - left - 1));
    s
}

/// The last `rows` characters of `name`, bottom-aligned and padded with spaces
/// on top. Partition names usually differ at the end (dates, shard ids).
pub(crate) fn vertical_label(name: &str, rows: usize) -> Vec<char> {
    let chars: Vec<char> = name.chars().collect();
    let tail = &chars[chars.len().saturating_sub(rows)..];
    let mut out = vec![' '; rows - tail.len()];
    out.extend_from_slice(tail);
    out
}

/// Right-aligned run count that never overflows its column.
pub(crate) fn count_label(count: usize, width: usize) -> String {
    let text = count.to_string();
    if text.len() <= width {
        format!("{text:>width$}")
    } else {
        format!("{:>width$}", "+")
    }
}

// ---------------------------------------------------------------------------
// MatrixGrid component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct MatrixGridProps {
    pub matrix: Option<RenderedMatrix>,
}

fn line_element(line: GridLine) -> AnyElement<'static> {
    element! {
        View(key: line.key, height: 1u32) {
            #(line.spans.into_iter().enumerate().map(|(i, span)| {
                element! {
                    View(key: i, background_color: span.bg.unwrap_or(Color::Reset)) {
                        Text(content: span.text, color: span.fg, weight: span.weight, wrap: TextWrap::NoWrap)
                    }
                }
            }))
        }
    }
    .into_any()
}

#[component]
pub fn MatrixGrid(props: &mut MatrixGridProps) -> impl Into<AnyElement<'static>> {
    let Some(matrix) = props.matrix.take() else {
        return element! { View }.into_any();
    };

    let body_height = matrix.body_height;
    let faint_fg = matrix.faint_fg;
    let thumb_fg = matrix.thumb_fg;

    element! {
        View(flex_direction: FlexDirection::Column, flex_grow: 1.0, padding_left: 1, padding_right: 1) {
            #(matrix.header.into_iter().map(line_element))
            View(flex_direction: FlexDirection::Row, height: body_height) {
                View(flex_direction: FlexDirection::Column, flex_grow: 1.0, overflow: Overflow::Hidden) {
                    #(matrix.empty_message.into_iter().map(|msg| {
                        element! {
                            View(padding_left: 2) {
                                Text(content: msg, color: faint_fg)
                            }
                        }
                    }))
                    #(matrix.body.into_iter().map(line_element))
                }
                Scrollbar(
                    scroll_info: Some(matrix.row_scroll),
                    track_length: body_height,
                    track_color: Some(faint_fg),
                    thumb_color: Some(thumb_fg),
                )
            }
            #(matrix.footer.into_iter().map(line_element))
            View(flex_direction: FlexDirection::Row, height: 1u32) {
                View(width: 0u32, flex_grow: 1.0)
                Scrollbar(
                    scroll_info: Some(matrix.column_scroll),
                    orientation: Orientation::Horizontal,
                    track_length: matrix.body_width,
                    track_color: Some(faint_fg),
                    thumb_color: Some(thumb_fg),
                )
            }
        }
    }
    .into_any()
}
