use anyhow::{Context as _, Result};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// A single key binding: maps a key chord to either a built-in action or a
/// shell command template.
#[derive(Debug, Clone, Deserialize)]
pub struct Keybinding {
    pub key: String,
    pub builtin: Option<String>,
    pub command: Option<String>,
    pub name: Option<String>,
}

/// All keybinding overrides from the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub universal: Vec<Keybinding>,
    pub matrix: Vec<Keybinding>,
    pub dialog: Vec<Keybinding>,
}

/// View-independent action identifier used for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinAction {
    // Universal
    MoveDown,
    MoveUp,
    MoveLeft,
    MoveRight,
    First,
    Last,
    PageLeft,
    PageRight,
    Refresh,
    Search,
    ToggleHelp,
    Quit,
    // Matrix
    OpenRuns,
    SortTotal,
    SortFinal,
    ClearSort,
    TogglePrevious,
    ToggleAge,
    ToggleFailuresOnly,
    AgeOlder,
    AgeNewer,
    CopyView,
    // Dialog
    CloseDialog,
    OpenRun,
    CopyRunId,
}

impl BuiltinAction {
    /// Parse a builtin action name from the config string.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "move_down" => Self::MoveDown,
            "move_up" => Self::MoveUp,
            "move_left" => Self::MoveLeft,
            "move_right" => Self::MoveRight,
            "first" => Self::First,
            "last" => Self::Last,
            "page_left" => Self::PageLeft,
            "page_right" => Self::PageRight,
            "refresh" => Self::Refresh,
            "search" => Self::Search,
            "toggle_help" => Self::ToggleHelp,
            "quit" => Self::Quit,
            "open_runs" => Self::OpenRuns,
            "sort_total" => Self::SortTotal,
            "sort_final" => Self::SortFinal,
            "clear_sort" => Self::ClearSort,
            "toggle_previous" => Self::TogglePrevious,
            "toggle_age" => Self::ToggleAge,
            "toggle_failures_only" => Self::ToggleFailuresOnly,
            "age_older" => Self::AgeOlder,
            "age_newer" => Self::AgeNewer,
            "copy_view" => Self::CopyView,
            "close_dialog" => Self::CloseDialog,
            "open_run" => Self::OpenRun,
            "copy_run_id" => Self::CopyRunId,
            _ => return None,
        })
    }

    /// Human-readable description of this action (for help overlay).
    pub fn description(self) -> &'static str {
        match self {
            Self::MoveDown => "Next step",
            Self::MoveUp => "Previous step",
            Self::MoveLeft => "Previous partition",
            Self::MoveRight => "Next partition",
            Self::First => "First partition",
            Self::Last => "Last partition",
            Self::PageLeft => "Scroll one page left",
            Self::PageRight => "Scroll one page right",
            Self::Refresh => "Refetch partitions",
            Self::Search => "Filter steps",
            Self::ToggleHelp => "Toggle help overlay",
            Self::Quit => "Quit",
            Self::OpenRuns => "Show runs for cell",
            Self::SortTotal => "Sort by total failures",
            Self::SortFinal => "Sort by final failures",
            Self::ClearSort => "Graph order",
            Self::TogglePrevious => "Show previous run states",
            Self::ToggleAge => "Colorize by age",
            Self::ToggleFailuresOnly => "Failures and gaps only",
            Self::AgeOlder => "Move age threshold older",
            Self::AgeNewer => "Move age threshold newer",
            Self::CopyView => "Copy view link",
            Self::CloseDialog => "Close dialog",
            Self::OpenRun => "Open run in browser",
            Self::CopyRunId => "Copy run id",
        }
    }
}

/// Resolved binding: what to do when a key is pressed.
#[derive(Debug, Clone)]
pub enum ResolvedBinding {
    Builtin(BuiltinAction),
    ShellCommand(String),
}

// ---------------------------------------------------------------------------
// Key string conversion
// ---------------------------------------------------------------------------

use iocraft::prelude::{KeyCode, KeyEventKind, KeyModifiers};

/// Convert a crossterm `KeyEvent` to our canonical key string format.
///
/// Examples: `"j"`, `"G"`, `"ctrl+c"`, `"alt+d"`, `"enter"`, `"space"`,
/// `"pagedown"`, `"up"`, `"["`.
pub fn key_event_to_string(
    code: KeyCode,
    modifiers: KeyModifiers,
    kind: KeyEventKind,
) -> Option<String> {
    if kind == KeyEventKind::Release {
        return None;
    }

    let base = match code {
        KeyCode::Char(' ') => "space".to_owned(),
        KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) => {
            c.to_ascii_lowercase().to_string()
        }
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "enter".to_owned(),
        KeyCode::Esc => "esc".to_owned(),
        KeyCode::Backspace => "backspace".to_owned(),
        KeyCode::Tab => "tab".to_owned(),
        KeyCode::Delete => "delete".to_owned(),
        KeyCode::Up => "up".to_owned(),
        KeyCode::Down => "down".to_owned(),
        KeyCode::Left => "left".to_owned(),
        KeyCode::Right => "right".to_owned(),
        KeyCode::PageUp => "pageup".to_owned(),
        KeyCode::PageDown => "pagedown".to_owned(),
        KeyCode::Home => "home".to_owned(),
        KeyCode::End => "end".to_owned(),
        KeyCode::F(n) => format!("f{n}"),
        _ => return None,
    };

    // Shift is carried by the char itself ('G' vs 'g').
    let mut prefix = String::new();
    if modifiers.contains(KeyModifiers::CONTROL) {
        prefix.push_str("ctrl+");
    }
    if modifiers.contains(KeyModifiers::ALT) {
        prefix.push_str("alt+");
    }

    Some(format!("{prefix}{base}"))
}

// ---------------------------------------------------------------------------
// Default keybindings
// ---------------------------------------------------------------------------

fn kb(key: &str, builtin: &str, name: &str) -> Keybinding {
    Keybinding {
        key: key.to_owned(),
        builtin: Some(builtin.to_owned()),
        command: None,
        name: Some(name.to_owned()),
    }
}

/// Default bindings active everywhere.
pub fn default_universal() -> Vec<Keybinding> {
    vec![
        kb("j", "move_down", "Next step"),
        kb("down", "move_down", "Next step"),
        kb("k", "move_up", "Previous step"),
        kb("up", "move_up", "Previous step"),
        kb("h", "move_left", "Previous partition"),
        kb("left", "move_left", "Previous partition"),
        kb("l", "move_right", "Next partition"),
        kb("right", "move_right", "Next partition"),
        kb("g", "first", "First partition"),
        kb("home", "first", "First partition"),
        kb("G", "last", "Last partition"),
        kb("end", "last", "Last partition"),
        kb("ctrl+u", "page_left", "Page left"),
        kb("pageup", "page_left", "Page left"),
        kb("ctrl+d", "page_right", "Page right"),
        kb("pagedown", "page_right", "Page right"),
        kb("r", "refresh", "Refetch partitions"),
        kb("/", "search", "Filter steps"),
        kb("?", "toggle_help", "Toggle help"),
        kb("q", "quit", "Quit"),
        kb("ctrl+c", "quit", "Quit"),
    ]
}

/// Default bindings for the matrix grid.
pub fn default_matrix() -> Vec<Keybinding> {
    vec![
        kb("enter", "open_runs", "Show runs for cell"),
        kb("t", "sort_total", "Sort by total failures"),
        kb("T", "sort_final", "Sort by final failures"),
        kb("s", "clear_sort", "Graph order"),
        kb("p", "toggle_previous", "Show previous run states"),
        kb("a", "toggle_age", "Colorize by age"),
        kb("f", "toggle_failures_only", "Failures and gaps only"),
        kb("[", "age_older", "Age threshold older"),
        kb("]", "age_newer", "Age threshold newer"),
        kb("y", "copy_view", "Copy view link"),
    ]
}

/// Default bindings while the run dialog is open.
pub fn default_dialog() -> Vec<Keybinding> {
    vec![
        kb("esc", "close_dialog", "Close dialog"),
        kb("q", "close_dialog", "Close dialog"),
        kb("enter", "close_dialog", "Close dialog"),
        kb("o", "open_run", "Open run in browser"),
        kb("y", "copy_run_id", "Copy run id"),
    ]
}

// ---------------------------------------------------------------------------
// Merged keybinding set
// ---------------------------------------------------------------------------

/// A fully resolved keybinding map: defaults merged with user overrides.
///
/// User overrides replace defaults for the same key.
#[derive(Debug, Clone)]
pub struct MergedBindings {
    pub universal: Vec<Keybinding>,
    pub matrix: Vec<Keybinding>,
    pub dialog: Vec<Keybinding>,
}

impl MergedBindings {
    /// Merge user config overrides on top of defaults.
    ///
    /// For each context, user bindings for a given key replace the default
    /// binding for that key. User bindings for keys not in defaults are appended.
    pub fn from_config(config: &KeybindingsConfig) -> Self {
        Self {
            universal: merge_lists(&default_universal(), &config.universal),
            matrix: merge_lists(&default_matrix(), &config.matrix),
            dialog: merge_lists(&default_dialog(), &config.dialog),
        }
    }

    /// Look up a key string, checking context-specific bindings first, then
    /// universal. Returns the resolved binding if found.
    pub fn resolve(&self, key: &str, context: ViewContext) -> Option<ResolvedBinding> {
        if let Some(binding) = find_binding(self.context_bindings(context), key) {
            return Some(binding);
        }
        find_binding(&self.universal, key)
    }

    /// Return all bindings for a given context, grouped as
    /// `(context_label, bindings)` pairs. Universal bindings come first.
    pub fn all_for_context(&self, context: ViewContext) -> Vec<(&'static str, &[Keybinding])> {
        let label = match context {
            ViewContext::Matrix => "Matrix",
            ViewContext::Dialog => "Run dialog",
        };
        vec![
            ("Universal", self.universal.as_slice()),
            (label, self.context_bindings(context)),
        ]
    }

    fn context_bindings(&self, context: ViewContext) -> &[Keybinding] {
        match context {
            ViewContext::Matrix => &self.matrix,
            ViewContext::Dialog => &self.dialog,
        }
    }
}

/// View context for keybinding resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewContext {
    Matrix,
    Dialog,
}

/// Merge user overrides on top of defaults. User bindings for the same key
/// replace the default; additional user bindings are appended.
fn merge_lists(defaults: &[Keybinding], overrides: &[Keybinding]) -> Vec<Keybinding> {
    let override_keys: std::collections::HashSet<&str> =
        overrides.iter().map(|b| b.key.as_str()).collect();

    let mut result: Vec<Keybinding> = defaults
        .iter()
        .filter(|b| !override_keys.contains(b.key.as_str()))
        .cloned()
        .collect();

    result.extend(overrides.iter().cloned());
    result
}

fn find_binding(bindings: &[Keybinding], key: &str) -> Option<ResolvedBinding> {
    bindings.iter().filter(|b| b.key == key).find_map(|b| {
        b.builtin
            .as_deref()
            .and_then(BuiltinAction::from_name)
            .map(ResolvedBinding::Builtin)
            .or_else(|| b.command.clone().map(ResolvedBinding::ShellCommand))
    })
}

// ---------------------------------------------------------------------------
// Template variable expansion
// ---------------------------------------------------------------------------

/// Context variables available for template expansion in custom commands.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    pub pipeline: String,
    pub partition: String,
    pub step: String,
    /// Latest run of the focused partition.
    pub run_id: String,
    pub url: String,
}

/// Expand `{{.Var}}` template variables in a command string.
pub fn expand_template(template: &str, vars: &TemplateVars) -> String {
    template
        .replace("{{.Pipeline}}", &vars.pipeline)
        .replace("{{.Partition}}", &vars.partition)
        .replace("{{.Step}}", &vars.step)
        .replace("{{.RunId}}", &vars.run_id)
        .replace("{{.Url}}", &vars.url)
}

// ---------------------------------------------------------------------------
// Shell command execution
// ---------------------------------------------------------------------------

/// Execute a shell command (after template expansion) and return its trimmed
/// stdout.
pub(crate) fn execute_shell_command(command: &str) -> Result<String> {
    let output = std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .context("spawning shell command")?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    } else {
        anyhow::bail!(
            "command failed (exit {}): {}",
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_chars_are_lowercased() {
        let s = key_event_to_string(
            KeyCode::Char('D'),
            KeyModifiers::CONTROL,
            KeyEventKind::Press,
        );
        assert_eq!(s.as_deref(), Some("ctrl+d"));
    }

    #[test]
    fn space_has_a_name() {
        let s = key_event_to_string(KeyCode::Char(' '), KeyModifiers::empty(), KeyEventKind::Press);
        assert_eq!(s.as_deref(), Some("space"));
    }

    #[test]
    fn expand_template_all_vars() {
        let vars = TemplateVars {
            pipeline: "etl".to_owned(),
            partition: "2024-01-01".to_owned(),
            step: "load".to_owned(),
            run_id: "abc123".to_owned(),
            url: "http://localhost:3000/instance/runs/abc123".to_owned(),
        };
        let result = expand_template(
            "echo {{.Pipeline}} {{.Partition}} {{.Step}} {{.RunId}} {{.Url}}",
            &vars,
        );
        assert_eq!(
            result,
            "echo etl 2024-01-01 load abc123 http://localhost:3000/instance/runs/abc123"
        );
    }

    #[test]
    fn merge_override_replaces_default() {
        let defaults = vec![kb("t", "sort_total", "Sort")];
        let overrides = vec![kb("t", "sort_final", "Sort final instead")];
        let merged = merge_lists(&defaults, &overrides);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].builtin.as_deref(), Some("sort_final"));
    }

    #[test]
    fn unknown_builtin_falls_back_to_command() {
        let bindings = vec![Keybinding {
            key: "z".to_owned(),
            builtin: Some("does_not_exist".to_owned()),
            command: Some("true".to_owned()),
            name: None,
        }];
        assert!(matches!(
            find_binding(&bindings, "z"),
            Some(ResolvedBinding::ShellCommand(ref cmd)) if cmd == "true"
        ));
    }

    #[test]
    fn execute_shell_echo() {
        let result = execute_shell_command("echo hello");
        assert_eq!(result.unwrap(), "hello");
    }
}
