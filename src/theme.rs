use crate::color::Color;
use crate::config::types::Theme;
use crate::matrix::StatusColor;

/// Detected terminal background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Dark,
    Light,
}

impl Background {
    /// Detect whether the terminal has a dark or light background.
    ///
    /// Heuristic: check `COLORFGBG` (format "fg;bg"), fall back to dark.
    pub fn detect() -> Self {
        if let Ok(val) = std::env::var("COLORFGBG")
            && let Some(bg) = val.rsplit(';').next()
            && let Ok(n) = bg.parse::<u8>()
        {
            // ANSI colors 0-6 and 8 are typically dark backgrounds.
            if n > 6 && n != 8 {
                return Background::Light;
            }
        }
        Background::Dark
    }
}

/// Resolved color for every matrix cell state.
#[derive(Debug, Clone, Copy)]
pub struct StatusPalette {
    pub success: Color,
    pub failure: Color,
    pub skipped: Color,
    pub in_progress: Color,
    pub missing: Color,
    pub failure_success: Color,
    pub failure_skipped: Color,
    pub failure_missing: Color,
    pub success_missing: Color,
    pub skipped_missing: Color,
}

impl StatusPalette {
    pub fn color(&self, status: StatusColor) -> Color {
        match status {
            StatusColor::Success => self.success,
            StatusColor::Failure => self.failure,
            StatusColor::Skipped => self.skipped,
            StatusColor::InProgress => self.in_progress,
            StatusColor::Missing => self.missing,
            StatusColor::FailureSuccess => self.failure_success,
            StatusColor::FailureSkipped => self.failure_skipped,
            StatusColor::FailureMissing => self.failure_missing,
            StatusColor::SuccessMissing => self.success_missing,
            StatusColor::SkippedMissing => self.skipped_missing,
        }
    }
}

/// A fully resolved theme: every color slot has a concrete `Color` value
/// (either from user config or from defaults for the detected background).
#[derive(Debug, Clone)]
pub struct ResolvedTheme {
    // Text
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_faint: Color,
    pub text_warning: Color,
    pub text_success: Color,
    pub text_error: Color,
    // Background
    pub bg_selected: Color,
    pub bg_base: Color,
    // Border
    pub border_primary: Color,
    pub border_faint: Color,
    // Matrix cells
    pub status: StatusPalette,
}

impl ResolvedTheme {
    /// Build a resolved theme from user config and detected background.
    pub fn resolve(theme: &Theme, bg: Background) -> Self {
        let d = Defaults::for_background(bg);
        let text = &theme.colors.text;
        let st = &theme.colors.status;

        Self {
            text_primary: text.primary.unwrap_or(d.text_primary),
            text_secondary: text.secondary.unwrap_or(d.text_secondary),
            text_faint: text.faint.unwrap_or(d.text_faint),
            text_warning: text.warning.unwrap_or(d.text_warning),
            text_success: text.success.unwrap_or(d.text_success),
            text_error: text.error.unwrap_or(d.text_error),
            bg_selected: theme.colors.background.selected.unwrap_or(d.bg_selected),
            bg_base: theme.colors.background.base.unwrap_or(d.bg_base),
            border_primary: theme.colors.border.primary.unwrap_or(d.border_primary),
            border_faint: theme.colors.border.faint.unwrap_or(d.border_faint),
            status: StatusPalette {
                success: st.success.unwrap_or(d.success),
                failure: st.failure.unwrap_or(d.failure),
                skipped: st.skipped.unwrap_or(d.skipped),
                in_progress: st.in_progress.unwrap_or(d.in_progress),
                missing: st.missing.unwrap_or(d.missing),
                failure_success: st.failure_success.unwrap_or(d.failure_success),
                failure_skipped: st.failure_skipped.unwrap_or(d.failure_skipped),
                failure_missing: st.failure_missing.unwrap_or(d.failure_missing),
                success_missing: st.success_missing.unwrap_or(d.success_missing),
                skipped_missing: st.skipped_missing.unwrap_or(d.skipped_missing),
            },
        }
    }
}

/// Default color values for a given terminal background.
struct Defaults {
    text_primary: Color,
    text_secondary: Color,
    text_faint: Color,
    text_warning: Color,
    text_success: Color,
    text_error: Color,
    bg_selected: Color,
    bg_base: Color,
    border_primary: Color,
    border_faint: Color,
    success: Color,
    failure: Color,
    skipped: Color,
    in_progress: Color,
    missing: Color,
    failure_success: Color,
    failure_skipped: Color,
    failure_missing: Color,
    success_missing: Color,
    skipped_missing: Color,
}

impl Defaults {
    fn for_background(bg: Background) -> Self {
        match bg {
            Background::Dark => Self {
                text_primary: Color::Ansi256(7),
                text_secondary: Color::Ansi256(245),
                text_faint: Color::Ansi256(243),
                text_warning: Color::Ansi256(11),
                text_success: Color::Ansi256(10),
                text_error: Color::Ansi256(1),
                bg_selected: Color::Ansi256(237),
                bg_base: Color::Hex { r: 0, g: 0, b: 0 },
                border_primary: Color::Ansi256(244),
                border_faint: Color::Ansi256(241),
                success: Color::Hex { r: 0x0f, g: 0x99, b: 0x60 },
                failure: Color::Hex { r: 0xdb, g: 0x37, b: 0x37 },
                skipped: Color::Hex { r: 0xd9, g: 0x82, b: 0x2b },
                in_progress: Color::Hex { r: 0x2b, g: 0x95, b: 0xd6 },
                missing: Color::Ansi256(239),
                failure_success: Color::Hex { r: 0x8a, g: 0xbd, b: 0x4b },
                failure_skipped: Color::Hex { r: 0xc2, g: 0x5d, b: 0x2f },
                failure_missing: Color::Hex { r: 0x8c, g: 0x2d, b: 0x2d },
                success_missing: Color::Hex { r: 0x1f, g: 0x5c, b: 0x43 },
                skipped_missing: Color::Hex { r: 0x7a, g: 0x52, b: 0x2a },
            },
            Background::Light => Self {
                text_primary: Color::Ansi256(0),
                text_secondary: Color::Ansi256(240),
                text_faint: Color::Ansi256(248),
                text_warning: Color::Ansi256(3),
                text_success: Color::Ansi256(2),
                text_error: Color::Ansi256(1),
                bg_selected: Color::Ansi256(254),
                bg_base: Color::Hex { r: 0xff, g: 0xff, b: 0xff },
                border_primary: Color::Ansi256(240),
                border_faint: Color::Ansi256(252),
                success: Color::Hex { r: 0x0f, g: 0x99, b: 0x60 },
                failure: Color::Hex { r: 0xdb, g: 0x37, b: 0x37 },
                skipped: Color::Hex { r: 0xd9, g: 0x82, b: 0x2b },
                in_progress: Color::Hex { r: 0x2b, g: 0x95, b: 0xd6 },
                missing: Color::Ansi256(252),
                failure_success: Color::Hex { r: 0x8a, g: 0xbd, b: 0x4b },
                failure_skipped: Color::Hex { r: 0xc2, g: 0x5d, b: 0x2f },
                failure_missing: Color::Hex { r: 0xf0, g: 0xa8, b: 0xa8 },
                success_missing: Color::Hex { r: 0xa6, g: 0xd9, b: 0xc0 },
                skipped_missing: Color::Hex { r: 0xf0, g: 0xc8, b: 0x9e },
            },
        }
    }
}
