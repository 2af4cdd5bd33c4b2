use iocraft::prelude::*;

use crate::color::ColorDepth;
use crate::theme::ResolvedTheme;

/// Most suggestions shown under the input line.
const MAX_SUGGESTIONS: usize = 5;

// ---------------------------------------------------------------------------
// Pre-rendered text input (step query)
// ---------------------------------------------------------------------------

pub struct RenderedTextInput {
    pub prompt: String,
    pub text: String,
    pub text_fg: Color,
    pub prompt_fg: Color,
    pub border_fg: Color,
    pub suggestions: Vec<RenderedSuggestion>,
}

pub struct RenderedSuggestion {
    pub text: String,
    pub fg: Color,
}

impl RenderedTextInput {
    pub fn build(
        prompt: &str,
        text: &str,
        suggestions: &[String],
        selected_index: Option<usize>,
        theme: &ResolvedTheme,
        depth: ColorDepth,
    ) -> Self {
        let text_fg = theme.text_primary.to_crossterm_color(depth);
        let highlight_fg = theme.text_success.to_crossterm_color(depth);

        let suggestions = suggestions
            .iter()
            .take(MAX_SUGGESTIONS)
            .enumerate()
            .map(|(i, s)| {
                let is_selected = selected_index == Some(i);
                RenderedSuggestion {
                    text: format!("{}{s}", if is_selected { "> " } else { "  " }),
                    fg: if is_selected { highlight_fg } else { text_fg },
                }
            })
            .collect();

        Self {
            prompt: prompt.to_owned(),
            text: format!("{text}\u{2588}"), // append full block cursor
            text_fg,
            prompt_fg: theme.text_secondary.to_crossterm_color(depth),
            border_fg: theme.border_faint.to_crossterm_color(depth),
            suggestions,
        }
    }
}

// ---------------------------------------------------------------------------
// Step name completion
// ---------------------------------------------------------------------------

/// The token being typed: the text after the last clause separator, with any
/// `*` or `+` selection operators stripped from its front.
pub(crate) fn current_token(query: &str) -> &str {
    let start = query
        .char_indices()
        .filter(|(_, c)| *c == ',' || c.is_whitespace())
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    query[start..].trim_start_matches(['*', '+'])
}

/// Filter candidates by a query string (case-insensitive substring match).
pub(crate) fn filter_suggestions(candidates: &[String], query: &str) -> Vec<String> {
    if query.is_empty() {
        return Vec::new();
    }
    let lower = query.to_lowercase();
    candidates
        .iter()
        .filter(|c| c.to_lowercase().contains(&lower) && c.as_str() != query)
        .cloned()
        .collect()
}

/// Replace the token being typed with `completion`, keeping its operators.
pub(crate) fn complete(query: &str, completion: &str) -> String {
    let token = current_token(query);
    let head = &query[..query.len() - token.len()];
    format!("{head}{completion}")
}

// ---------------------------------------------------------------------------
// TextInput component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct TextInputProps {
    pub input: Option<RenderedTextInput>,
}

#[component]
pub fn TextInput(props: &mut TextInputProps) -> impl Into<AnyElement<'static>> {
    let Some(input) = props.input.take() else {
        return element! { View }.into_any();
    };

    element! {
        View(
            flex_direction: FlexDirection::Column,
            border_style: BorderStyle::Single,
            border_edges: Edges::Top,
            border_color: input.border_fg,
            padding_left: 1,
            padding_right: 1,
        ) {
            View(flex_direction: FlexDirection::Row) {
                Text(content: input.prompt, color: input.prompt_fg, wrap: TextWrap::NoWrap)
                Text(content: " ", color: input.text_fg)
                Text(content: input.text, color: input.text_fg, wrap: TextWrap::NoWrap)
            }
            #(input.suggestions.into_iter().enumerate().map(|(i, s)| {
                element! {
                    View(key: i) {
                        Text(content: s.text, color: s.fg, wrap: TextWrap::NoWrap)
                    }
                }
            }))
        }
    }
    .into_any()
}
