use std::ops::Range;

/// Horizontal geometry of the scrollable partition area.
///
/// All values share one unit: terminal cells in the TUI, pixels in the
/// worked examples below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportRequest {
    pub scroll_offset: usize,
    pub visible_width: usize,
    pub column_width: usize,
    pub overscan: usize,
}

/// Columns to render: `start..start + count`, before clamping to the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportWindow {
    pub start: usize,
    pub count: usize,
}

impl ViewportWindow {
    /// Index range that is safe to slice a list of `total` columns with.
    pub fn clamp(self, total: usize) -> Range<usize> {
        let start = self.start.min(total);
        let end = self.start.saturating_add(self.count).min(total);
        start..end
    }
}

/// A column to draw and its left edge relative to the viewport.
///
/// `x` is negative for overscan columns left of the visible area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderColumn {
    pub index: usize,
    pub x: i64,
}

/// Columns covering the visible area plus `overscan` on both sides.
///
/// `start = floor((scroll - overscan) / width)` (never negative) and
/// `count = ceil((visible + 2 * overscan) / width)`.
pub fn visible_window(request: ViewportRequest) -> ViewportWindow {
    let ViewportRequest {
        scroll_offset,
        visible_width,
        column_width,
        overscan,
    } = request;
    if column_width == 0 {
        return ViewportWindow::default();
    }
    let start = scroll_offset.saturating_sub(overscan) / column_width;
    let span = visible_width.saturating_add(overscan.saturating_mul(2));
    ViewportWindow {
        start,
        count: span.div_ceil(column_width),
    }
}

/// Render list for `total` columns at the requested scroll position.
pub fn render_list(request: ViewportRequest, total: usize) -> Vec<RenderColumn> {
    let width = i64::try_from(request.column_width).unwrap_or(i64::MAX);
    let scroll = i64::try_from(request.scroll_offset).unwrap_or(i64::MAX);
    visible_window(request)
        .clamp(total)
        .map(|index| {
            let left = i64::try_from(index).unwrap_or(i64::MAX).saturating_mul(width);
            RenderColumn {
                index,
                x: left.saturating_sub(scroll),
            }
        })
        .collect()
}

/// Largest scroll offset that still fills the viewport.
pub fn max_scroll(total: usize, column_width: usize, visible_width: usize) -> usize {
    total
        .saturating_mul(column_width)
        .saturating_sub(visible_width)
}

/// Scroll offset that brings column `index` fully into view, moving as little
/// as possible from `scroll_offset`.
pub fn scroll_to_reveal(
    scroll_offset: usize,
    index: usize,
    column_width: usize,
    visible_width: usize,
) -> usize {
    let left = index.saturating_mul(column_width);
    let right = left.saturating_add(column_width);
    if left < scroll_offset {
        left
    } else if right > scroll_offset.saturating_add(visible_width) {
        right.saturating_sub(visible_width)
    } else {
        scroll_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(scroll: usize, visible: usize) -> ViewportRequest {
        ViewportRequest {
            scroll_offset: scroll,
            visible_width: visible,
            column_width: 23,
            overscan: 150,
        }
    }

    #[test]
    fn worked_example() {
        let w = visible_window(request(500, 800));
        assert_eq!(w, ViewportWindow { start: 15, count: 48 });
        // Columns 15..63 span pixels 345..1449.
        assert!(w.start * 23 <= 500);
        assert!((w.start + w.count) * 23 >= 1300);
    }

    #[test]
    fn window_covers_visible_range_everywhere() {
        for scroll in (0..3000).step_by(7) {
            for visible in [0, 1, 22, 23, 300, 801] {
                let w = visible_window(request(scroll, visible));
                assert!(w.start * 23 <= scroll, "scroll {scroll} visible {visible}");
                assert!(
                    (w.start + w.count) * 23 >= scroll + visible,
                    "scroll {scroll} visible {visible}"
                );
            }
        }
    }

    #[test]
    fn start_is_never_negative() {
        assert_eq!(visible_window(request(0, 100)).start, 0);
        assert_eq!(visible_window(request(149, 100)).start, 0);
    }

    #[test]
    fn clamp_never_exceeds_total() {
        let w = visible_window(request(500, 800));
        assert_eq!(w.clamp(20), 15..20);
        assert_eq!(w.clamp(10), 10..10);
        assert_eq!(w.clamp(1000), 15..63);
    }

    #[test]
    fn zero_column_width_renders_nothing() {
        let req = ViewportRequest {
            column_width: 0,
            ..request(10, 10)
        };
        assert!(render_list(req, 5).is_empty());
    }

    #[test]
    fn render_list_offsets_are_relative_to_scroll() {
        let req = ViewportRequest {
            scroll_offset: 6,
            visible_width: 9,
            column_width: 3,
            overscan: 3,
        };
        let cols = render_list(req, 100);
        assert_eq!(cols.first(), Some(&RenderColumn { index: 1, x: -3 }));
        assert_eq!(cols.len(), 5);
        assert_eq!(cols.last(), Some(&RenderColumn { index: 5, x: 9 }));
    }

    #[test]
    fn reveal_moves_minimally() {
        assert_eq!(scroll_to_reveal(30, 5, 3, 12), 15);
        assert_eq!(scroll_to_reveal(0, 5, 3, 12), 6);
        assert_eq!(scroll_to_reveal(6, 5, 3, 12), 6);
        assert_eq!(max_scroll(10, 3, 12), 18);
        assert_eq!(max_scroll(2, 3, 12), 0);
    }
}
