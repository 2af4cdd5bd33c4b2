use chrono::{DateTime, Utc};
use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::theme::ResolvedTheme;

// ---------------------------------------------------------------------------
// Footer component: structured status bar
// ---------------------------------------------------------------------------

pub struct RenderedFooter {
    pub scope_label: String,
    pub context_text: String,
    pub updated_text: String,
    pub help_hint: String,
    pub text_fg: Color,
    pub scope_fg: Color,
    pub context_fg: Color,
    pub border_fg: Color,
}

impl RenderedFooter {
    /// `is_error` colours the context text as an error (fetch failures).
    pub fn build(
        scope_label: String,
        context_text: String,
        updated_text: String,
        is_error: bool,
        theme: &ResolvedTheme,
        depth: ColorDepth,
    ) -> Self {
        let text_fg = theme.text_faint.to_crossterm_color(depth);
        let context_fg = if is_error {
            theme.text_error.to_crossterm_color(depth)
        } else {
            text_fg
        };
        Self {
            scope_label,
            context_text,
            updated_text,
            help_hint: "? help".to_owned(),
            text_fg,
            scope_fg: theme.text_primary.to_crossterm_color(depth),
            context_fg,
            border_fg: theme.border_faint.to_crossterm_color(depth),
        }
    }
}

/// Format the last fetch time as a human-readable "Updated ~Xs ago" string.
pub fn format_updated_ago(fetched_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(t) = fetched_at else {
        return String::new();
    };
    let elapsed = now.signed_duration_since(t).num_seconds().max(0);
    if elapsed < 60 {
        format!("Updated ~{elapsed}s ago")
    } else if elapsed < 3600 {
        format!("Updated ~{}m ago", elapsed / 60)
    } else {
        format!("Updated ~{}h ago", elapsed / 3600)
    }
}

#[derive(Default, Props)]
pub struct FooterProps {
    pub footer: Option<RenderedFooter>,
}

#[component]
pub fn Footer(props: &mut FooterProps) -> impl Into<AnyElement<'static>> {
    let Some(f) = props.footer.take() else {
        return element! { View }.into_any();
    };

    let has_context = !f.context_text.is_empty();
    let has_updated = !f.updated_text.is_empty();

    let mut context_contents = Vec::new();
    if has_context {
        context_contents.push(MixedTextContent::new(&f.context_text).color(f.context_fg));
    }
    if has_context && has_updated {
        context_contents.push(MixedTextContent::new("  \u{2022}  ").color(f.text_fg));
    }
    if has_updated {
        context_contents.push(MixedTextContent::new(&f.updated_text).color(f.text_fg));
    }

    element! {
        View(
            border_style: BorderStyle::Single,
            border_edges: Edges::Top,
            border_color: f.border_fg,
            padding_left: 1,
            padding_right: 1,
        ) {
            Text(content: f.scope_label.clone(), color: f.scope_fg, weight: Weight::Bold, wrap: TextWrap::NoWrap)
            Text(content: " \u{2502} ", color: f.text_fg, wrap: TextWrap::NoWrap)
            View(flex_grow: 1.0) {
                MixedText(contents: context_contents, wrap: TextWrap::NoWrap)
            }
            Text(content: " \u{2502} ", color: f.text_fg, wrap: TextWrap::NoWrap)
            Text(content: f.help_hint.clone(), color: f.text_fg, wrap: TextWrap::NoWrap)
        }
    }
    .into_any()
}
