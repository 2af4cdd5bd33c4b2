use iocraft::prelude::*;

// ---------------------------------------------------------------------------
// Scroll metadata
// ---------------------------------------------------------------------------

/// Carries scroll metadata used to render a scrollbar.
#[derive(Debug, Clone, Copy)]
pub struct ScrollInfo {
    pub scroll_offset: usize,
    pub visible_count: usize,
    pub total_count: usize,
}

impl ScrollInfo {
    /// Returns `true` when the content overflows the visible area.
    pub fn needs_scrollbar(&self) -> bool {
        self.total_count > self.visible_count
    }

    /// Thumb start and size within a track of `track_len` cells.
    ///
    /// The thumb is at least one cell long and positioned proportionally to
    /// the scroll offset.
    pub fn thumb_geometry(&self, track_len: u32) -> (u32, u32) {
        if track_len == 0 || !self.needs_scrollbar() {
            return (0, track_len);
        }

        #[allow(clippy::cast_precision_loss)]
        let ratio = self.visible_count as f64 / self.total_count as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let thumb_size = (ratio * f64::from(track_len)).round().max(1.0) as u32;
        let thumb_size = thumb_size.min(track_len);

        let max_scroll = self.total_count.saturating_sub(self.visible_count);
        let available = track_len.saturating_sub(thumb_size);

        #[allow(clippy::cast_precision_loss)]
        let thumb_start = if max_scroll == 0 {
            0
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let start = (self.scroll_offset as f64 / max_scroll as f64 * f64::from(available))
                .round() as u32;
            start.min(available)
        };

        (thumb_start, thumb_size)
    }
}

// ---------------------------------------------------------------------------
// Scrollbar component
// ---------------------------------------------------------------------------

/// Which way the track runs: step rows scroll vertically, partitions
/// horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

impl Orientation {
    fn glyphs(self) -> (&'static str, &'static str) {
        match self {
            // U+2591 light shade, U+2588 full block
            Self::Vertical => ("\u{2591}", "\u{2588}"),
            // U+2500 box-drawing light horizontal, U+2501 heavy horizontal
            Self::Horizontal => ("\u{2500}", "\u{2501}"),
        }
    }
}

#[derive(Default, Props)]
pub struct ScrollbarProps {
    pub scroll_info: Option<ScrollInfo>,
    pub orientation: Orientation,
    /// Rows for a vertical bar, columns for a horizontal one.
    pub track_length: u32,
    pub track_color: Option<Color>,
    pub thumb_color: Option<Color>,
}

#[component]
pub fn Scrollbar(props: &mut ScrollbarProps) -> impl Into<AnyElement<'static>> {
    let track_length = props.track_length;
    let track_color = props.track_color.unwrap_or(Color::DarkGrey);
    let thumb_color = props.thumb_color.unwrap_or(Color::White);
    let orientation = props.orientation;

    let Some(info) = props
        .scroll_info
        .take()
        .filter(|i| i.needs_scrollbar() && track_length > 0)
    else {
        return element! { View(width: 0u32) }.into_any();
    };

    if orientation == Orientation::Horizontal {
        let (track, thumb) = orientation.glyphs();
        let (thumb_start, thumb_size) = info.thumb_geometry(track_length);
        let after_len = track_length.saturating_sub(thumb_start + thumb_size);
        let before = track.repeat(thumb_start as usize);
        let thumb = thumb.repeat(thumb_size as usize);
        let after = track.repeat(after_len as usize);
        return element! {
            View(flex_direction: FlexDirection::Row, width: track_length, height: 1u32) {
                Text(content: before, color: track_color, wrap: TextWrap::NoWrap)
                Text(content: thumb, color: thumb_color, wrap: TextWrap::NoWrap)
                Text(content: after, color: track_color, wrap: TextWrap::NoWrap)
            }
        }
        .into_any();
    }

    let (track, thumb) = orientation.glyphs();
    let (thumb_start, thumb_size) = info.thumb_geometry(track_length);
    let cells: Vec<(usize, &str, Color)> = (0..track_length)
        .map(|row| {
            let in_thumb = row >= thumb_start && row < thumb_start + thumb_size;
            let (ch, color) = if in_thumb {
                (thumb, thumb_color)
            } else {
                (track, track_color)
            };
            (row as usize, ch, color)
        })
        .collect();

    element! {
        View(flex_direction: FlexDirection::Column, width: 1u32) {
            #(cells.into_iter().map(|(key, ch, color)| {
                element! {
                    View(key) {
                        Text(content: ch, color: color)
                    }
                }
            }))
        }
    }
    .into_any()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_scrollbar_when_content_fits() {
        let info = ScrollInfo {
            scroll_offset: 0,
            visible_count: 20,
            total_count: 10,
        };
        assert!(!info.needs_scrollbar());
    }

    #[test]
    fn needs_scrollbar_when_overflows() {
        let info = ScrollInfo {
            scroll_offset: 0,
            visible_count: 10,
            total_count: 20,
        };
        assert!(info.needs_scrollbar());
    }

    #[test]
    fn thumb_at_top_when_offset_zero() {
        let info = ScrollInfo {
            scroll_offset: 0,
            visible_count: 10,
            total_count: 100,
        };
        let (start, size) = info.thumb_geometry(20);
        assert_eq!(start, 0);
        assert!(size >= 1);
        assert!(size <= 20);
    }

    #[test]
    fn thumb_at_bottom_when_max_offset() {
        let info = ScrollInfo {
            scroll_offset: 90,
            visible_count: 10,
            total_count: 100,
        };
        let (start, size) = info.thumb_geometry(20);
        assert_eq!(start + size, 20);
    }

    #[test]
    fn thumb_proportional_to_viewport() {
        let info = ScrollInfo {
            scroll_offset: 0,
            visible_count: 50,
            total_count: 100,
        };
        let (_, size) = info.thumb_geometry(20);
        assert_eq!(size, 10);
    }

    #[test]
    fn thumb_min_size_one() {
        let info = ScrollInfo {
            scroll_offset: 0,
            visible_count: 1,
            total_count: 10000,
        };
        let (_, size) = info.thumb_geometry(20);
        assert_eq!(size, 1);
    }

    #[test]
    fn zero_length_track() {
        let info = ScrollInfo {
            scroll_offset: 0,
            visible_count: 10,
            total_count: 100,
        };
        let (start, size) = info.thumb_geometry(0);
        assert_eq!(start, 0);
        assert_eq!(size, 0);
    }
}
