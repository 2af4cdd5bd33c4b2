use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::matrix::AgeThreshold;
use crate::theme::ResolvedTheme;
use crate::view_state::DisplayOptions;

const SLIDER_WIDTH: usize = 16;

// ---------------------------------------------------------------------------
// Options bar: display toggles and the age threshold slider
// ---------------------------------------------------------------------------

pub struct RenderedToggle {
    pub label: String,
    pub fg: Color,
}

pub struct RenderedOptionsBar {
    pub toggles: Vec<RenderedToggle>,
    /// Present only while colouring by age.
    pub slider: Option<String>,
    pub step_query: String,
    pub text_fg: Color,
    pub faint_fg: Color,
    pub accent_fg: Color,
    pub border_fg: Color,
}

impl RenderedOptionsBar {
    pub fn build(
        options: DisplayOptions,
        age_threshold: AgeThreshold,
        step_query: &str,
        theme: &ResolvedTheme,
        depth: ColorDepth,
    ) -> Self {
        let on_fg = theme.text_primary.to_crossterm_color(depth);
        let off_fg = theme.text_faint.to_crossterm_color(depth);
        let toggle = |on: bool, key: char, label: &str| RenderedToggle {
            label: format!("{} {label} ({key})", checkbox(on)),
            fg: if on { on_fg } else { off_fg },
        };

        Self {
            toggles: vec![
                toggle(options.show_previous, 'p', "Show previous states"),
                toggle(options.colorize_by_age, 'a', "Colorize by age"),
                toggle(
                    options.show_failures_and_gaps_only,
                    'f',
                    "Failures & gaps only",
                ),
            ],
            slider: options
                .colorize_by_age
                .then(|| slider(age_threshold.fraction(), SLIDER_WIDTH)),
            step_query: if step_query.trim().is_empty() {
                "*".to_owned()
            } else {
                step_query.to_owned()
            },
            text_fg: theme.text_secondary.to_crossterm_color(depth),
            faint_fg: off_fg,
            accent_fg: theme.text_warning.to_crossterm_color(depth),
            border_fg: theme.border_faint.to_crossterm_color(depth),
        }
    }
}

fn checkbox(on: bool) -> &'static str {
    if on { "[x]" } else { "[ ]" }
}

/// `[`, track with a knob at `fraction`, `]`.
pub(crate) fn slider(fraction: f32, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let knob = ((fraction.clamp(0.0, 1.0) * (width - 1) as f32).round() as usize).min(width - 1);
    let track: String = (0..width)
        .map(|i| match i.cmp(&knob) {
            std::cmp::Ordering::Less => '\u{2501}',
            std::cmp::Ordering::Equal => '\u{25cf}',
            std::cmp::Ordering::Greater => '\u{2500}',
        })
        .collect();
    format!("[{track}]")
}

#[derive(Default, Props)]
pub struct OptionsBarProps {
    pub bar: Option<RenderedOptionsBar>,
}

#[component]
pub fn OptionsBar(props: &mut OptionsBarProps) -> impl Into<AnyElement<'static>> {
    let Some(bar) = props.bar.take() else {
        return element! { View }.into_any();
    };

    let faint_fg = bar.faint_fg;
    let accent_fg = bar.accent_fg;

    element! {
        View(
            border_style: BorderStyle::Single,
            border_edges: Edges::Bottom,
            border_color: bar.border_fg,
            padding_left: 1,
            padding_right: 1,
            height: 2u32,
        ) {
            #(bar.toggles.into_iter().enumerate().map(|(i, t)| {
                element! {
                    View(key: i, margin_right: 2) {
                        Text(content: t.label, color: t.fg, wrap: TextWrap::NoWrap)
                    }
                }
            }))
            #(bar.slider.into_iter().map(|s| {
                element! {
                    View(margin_right: 2) {
                        Text(content: format!("age {s} ([ ])"), color: accent_fg, wrap: TextWrap::NoWrap)
                    }
                }
            }))
            View(flex_grow: 1.0)
            Text(content: "steps: ", color: faint_fg, wrap: TextWrap::NoWrap)
            Text(content: bar.step_query, color: bar.text_fg, wrap: TextWrap::NoWrap)
        }
    }
    .into_any()
}
