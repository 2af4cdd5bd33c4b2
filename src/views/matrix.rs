use chrono::{DateTime, Utc};
use iocraft::prelude::*;

use crate::actions::clipboard;
use crate::color::ColorDepth;
use crate::components::footer::{self, Footer, RenderedFooter};
use crate::components::help_overlay::{HelpOverlay, HelpOverlayBuildConfig, RenderedHelpOverlay};
use crate::components::matrix_grid::{
    FOOTER_ROWS, GridGeometry, HEADER_ROWS, MatrixBuildConfig, MatrixGrid, RenderedMatrix,
};
use crate::components::options_bar::{OptionsBar, RenderedOptionsBar};
use crate::components::run_dialog::{self, RenderedRunDialog, RunDialog, RunDialogBuildConfig};
use crate::components::text_input::{self, RenderedTextInput, TextInput};
use crate::config::keybindings::{
    BuiltinAction, MergedBindings, ResolvedBinding, TemplateVars, ViewContext,
    execute_shell_command, expand_template, key_event_to_string,
};
use crate::config::types::{AppConfig, MatrixConfig};
use crate::dagster::client::run_url;
use crate::engine::{EngineHandle, Event, Request};
use crate::matrix::viewport::{max_scroll, scroll_to_reveal};
use crate::matrix::{
    AgeThreshold, MatrixData, PartitionColumn, StepGraph, build_for_query, sort_rows,
};
use crate::theme::ResolvedTheme;
use crate::types::{Partition, PipelineSnapshotOrError};
use crate::view_state::{Selection, ViewState, ViewStateStore};

use super::default_theme;

/// Rows taken by everything but the grid body: options bar, partition
/// header, run counts, horizontal track and the footer.
const CHROME_ROWS: usize = 2 + HEADER_ROWS + FOOTER_ROWS + 1 + 2;

// ---------------------------------------------------------------------------
// View-local state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    /// Editing the step query.
    Search,
}

/// Pipeline structure as last reported by the engine.
#[derive(Debug, Clone, Default)]
enum PipelineLoad {
    #[default]
    Loading,
    Ready(StepGraph),
    NotFound(String),
}

/// Names and run facts the key handler needs, detached from the derived
/// matrix so it can move into the event closure.
#[derive(Debug, Clone, Default)]
struct GridIndex {
    partitions: Vec<String>,
    has_runs: Vec<bool>,
    /// Newest run id of each partition.
    latest_runs: Vec<Option<String>>,
    steps: Vec<String>,
}

impl GridIndex {
    fn from_data(data: &MatrixData) -> Self {
        Self {
            partitions: data.columns.iter().map(|c| c.name.clone()).collect(),
            has_runs: data.columns.iter().map(|c| !c.is_empty()).collect(),
            latest_runs: data
                .columns
                .iter()
                .map(|c| c.runs.last().map(|r| r.run_id.clone()))
                .collect(),
            steps: data.rows.iter().map(|r| r.name.clone()).collect(),
        }
    }

    /// Position of `cursor`, falling back to the newest partition and the
    /// first step for names that are not (or no longer) in the grid.
    fn resolve(&self, cursor: Option<&Selection>) -> Option<(usize, usize)> {
        if self.partitions.is_empty() || self.steps.is_empty() {
            return None;
        }
        let column = cursor
            .and_then(|s| self.partitions.iter().position(|p| *p == s.partition))
            .unwrap_or(self.partitions.len() - 1);
        let row = cursor
            .and_then(|s| self.steps.iter().position(|p| *p == s.step))
            .unwrap_or(0);
        Some((column, row))
    }

    fn selection(&self, column: usize, row: usize) -> Option<Selection> {
        Some(Selection {
            partition: self.partitions.get(column)?.clone(),
            step: self.steps.get(row)?.clone(),
        })
    }

    /// Cursor moved by a signed delta, clamped to the grid.
    fn moved(&self, from: (usize, usize), columns: isize, rows: isize) -> Option<Selection> {
        self.selection(
            offset(from.0, columns, self.partitions.len()),
            offset(from.1, rows, self.steps.len()),
        )
    }
}

fn offset(index: usize, delta: isize, len: usize) -> usize {
    index
        .saturating_add_signed(delta)
        .min(len.saturating_sub(1))
}

/// Column the run dialog shows. The dialog is open only when this exists,
/// so a restored focus does not capture keys before the grid is built.
fn dialog_column<'a>(
    state: &ViewState,
    data: Option<&'a MatrixData>,
) -> Option<&'a PartitionColumn> {
    let sel = state.focused.as_ref()?;
    data?.columns.iter().find(|c| c.name == sel.partition)
}

/// Store `next` and write it to the state file when it differs.
fn commit_view_state(state: &mut State<ViewState>, store: Option<&ViewStateStore>, next: ViewState) {
    if *state.read() == next {
        return;
    }
    if let Some(store) = store
        && let Err(e) = store.save(&next)
    {
        tracing::warn!("{e:#}");
    }
    state.set(next);
}

fn report(result: Result<(), String>, ok: String, failed: &str) -> String {
    match result {
        Ok(()) => ok,
        Err(e) => format!("{failed}: {e}"),
    }
}

// ---------------------------------------------------------------------------
// MatrixView component
// ---------------------------------------------------------------------------

#[derive(Default, Props)]
pub struct MatrixViewProps<'a> {
    pub config: Option<&'a AppConfig>,
    /// Engine handle.
    pub engine: Option<&'a EngineHandle>,
    pub theme: Option<&'a ResolvedTheme>,
    /// Merged keybindings for dispatch and the help overlay.
    pub keybindings: Option<&'a MergedBindings>,
    pub color_depth: ColorDepth,
    pub width: u16,
    pub height: u16,
    pub should_exit: Option<State<bool>>,
    /// State restored at startup (saved file or `--view` link).
    pub initial_state: Option<&'a ViewState>,
    /// Where view state changes are written back.
    pub view_store: Option<&'a ViewStateStore>,
}

#[component]
#[allow(clippy::too_many_lines)]
pub fn MatrixView<'a>(props: &MatrixViewProps<'a>, mut hooks: Hooks) -> impl Into<AnyElement<'a>> {
    let theme = props.theme.cloned().unwrap_or_else(default_theme);
    let depth = props.color_depth;
    let should_exit = props.should_exit;
    let matrix_cfg = props
        .config
        .map(|c| c.matrix.clone())
        .unwrap_or_else(MatrixConfig::default);
    let dagster_cfg = props.config.map(|c| c.dagster.clone()).unwrap_or_default();
    let selector = dagster_cfg.selector();
    let partition_set = dagster_cfg.partition_set_name.clone();
    let store = props.view_store.cloned();

    let initial = props.initial_state.cloned().unwrap_or_default();
    let initial_cursor = initial.focused.clone();
    let mut view_state = hooks.use_state(move || initial);
    let mut cursor = hooks.use_state(move || initial_cursor);
    let mut scroll_offset = hooks.use_state(|| 0usize);
    let mut row_offset = hooks.use_state(|| 0usize);
    // The first data load scrolls to the newest partitions.
    let mut scrolled_to_end = hooks.use_state(|| false);
    let mut age_threshold = hooks.use_state(AgeThreshold::default);
    let mut dialog_cursor = hooks.use_state(|| 0usize);
    let mut help_visible = hooks.use_state(|| false);

    let mut input_mode = hooks.use_state(|| InputMode::Normal);
    let mut input_buffer = hooks.use_state(String::new);
    let mut suggestion_idx = hooks.use_state(|| Option::<usize>::None);
    let mut action_status = hooks.use_state(|| Option::<String>::None);

    let mut pipeline = hooks.use_state(PipelineLoad::default);
    let mut partitions = hooks.use_state(Vec::<Partition>::new);
    let mut fetched_at = hooks.use_state(|| Option::<DateTime<Utc>>::None);
    let mut fetch_error = hooks.use_state(|| Option::<String>::None);
    let mut loading = hooks.use_state(|| true);
    let mut requested = hooks.use_state(|| false);

    // Event channel: engine pushes events back to the view.
    let event_channel = hooks.use_state(|| {
        let (tx, rx) = std::sync::mpsc::channel::<Event>();
        (tx, std::sync::Arc::new(std::sync::Mutex::new(rx)))
    });
    let (event_tx, event_rx_arc) = event_channel.read().clone();
    let engine: Option<EngineHandle> = props.engine.cloned();

    // Initial fetch and background refresh registration, once at mount.
    if !requested.get()
        && let Some(ref eng) = engine
    {
        // Registered first so the scheduler sees the initial fetch complete.
        if dagster_cfg.refetch_interval_minutes > 0 {
            eng.send(Request::RegisterRefresh {
                selector: selector.clone(),
                partition_set: partition_set.clone(),
                notify_tx: event_tx.clone(),
            });
        }
        eng.send(Request::FetchPipeline {
            selector: selector.clone(),
            reply_tx: event_tx.clone(),
        });
        eng.send(Request::FetchPartitions {
            selector: selector.clone(),
            partition_set: partition_set.clone(),
            force: false,
            reply_tx: event_tx.clone(),
        });
        requested.set(true);
    }

    // Event polling: drain events from the engine reply channel.
    {
        let rx_for_poll = event_rx_arc.clone();
        hooks.use_future(async move {
            loop {
                smol::Timer::after(std::time::Duration::from_millis(100)).await;
                let events: Vec<Event> = {
                    let Ok(rx) = rx_for_poll.lock() else {
                        continue;
                    };
                    let mut evts = Vec::new();
                    while let Ok(evt) = rx.try_recv() {
                        evts.push(evt);
                    }
                    evts
                };
                for evt in events {
                    match evt {
                        Event::PipelineFetched { snapshot } => match snapshot {
                            PipelineSnapshotOrError::Snapshot(snapshot) => {
                                pipeline.set(PipelineLoad::Ready(StepGraph::from_snapshot(
                                    &snapshot,
                                )));
                            }
                            PipelineSnapshotOrError::NotFound { message } => {
                                pipeline.set(PipelineLoad::NotFound(message));
                            }
                        },
                        Event::PartitionsFetched {
                            partitions: fetched,
                            fetched_at: at,
                        } => {
                            partitions.set(fetched);
                            fetched_at.set(Some(at));
                            fetch_error.set(None);
                            loading.set(false);
                        }
                        Event::FetchError { context, message } => {
                            tracing::warn!("fetch {context} failed: {message}");
                            fetch_error.set(Some(format!("{context}: {message}")));
                            loading.set(false);
                        }
                    }
                }
            }
        });
    }

    // Derived pipeline: builder -> sort. Recomputed on every render.
    let vs = view_state.read().clone();
    let mode = input_mode.get();
    let (data, step_names) = {
        let load = pipeline.read();
        let graph = match &*load {
            PipelineLoad::Ready(graph) => Some(graph),
            PipelineLoad::Loading | PipelineLoad::NotFound(_) => None,
        };
        let data = build_for_query(&partitions.read(), graph, &vs.step_query, &vs.options).map(
            |mut data| {
                sort_rows(&mut data, vs.sort);
                data
            },
        );
        let names: Vec<String> = if mode == InputMode::Search {
            graph.map_or_else(Vec::new, |g| g.names().map(str::to_owned).collect())
        } else {
            Vec::new()
        };
        (data, names)
    };
    let index = data.as_ref().map(GridIndex::from_data).unwrap_or_default();

    // A refresh that drops the focused partition closes its dialog.
    if let Some(next) = vs.reconcile_focus(data.as_ref(), fetched_at.read().is_some()) {
        commit_view_state(&mut view_state, store.as_ref(), next);
        dialog_cursor.set(0);
    }

    // Search suggestions for the token being typed.
    let buffer = input_buffer.read().clone();
    let suggestions = if mode == InputMode::Search {
        text_input::filter_suggestions(&step_names, text_input::current_token(&buffer))
    } else {
        Vec::new()
    };
    let selected_suggestion = suggestion_idx
        .get()
        .filter(|_| !suggestions.is_empty())
        .map(|i| i.min(suggestions.len() - 1));
    let input_rows = if mode == InputMode::Search {
        2 + suggestions.len().min(5)
    } else {
        0
    };

    let geometry = GridGeometry::new(props.width, matrix_cfg.label_width, matrix_cfg.column_width);
    let visible_rows = usize::from(props.height)
        .saturating_sub(CHROME_ROWS + input_rows)
        .max(1);
    let cursor_pos = index.resolve(cursor.read().as_ref());

    let max_h = max_scroll(
        index.partitions.len(),
        geometry.column_width,
        geometry.body_width,
    );
    if !scrolled_to_end.get() && !index.partitions.is_empty() {
        scrolled_to_end.set(true);
        let target = cursor_pos.map_or(max_h, |(column, _)| {
            scroll_to_reveal(max_h, column, geometry.column_width, geometry.body_width)
        });
        scroll_offset.set(target);
    }
    let scroll = scroll_offset.get().min(max_h);
    let rows_off = row_offset
        .get()
        .min(index.steps.len().saturating_sub(visible_rows));

    // Runs of the focused partition in dialog order.
    let focused_column = dialog_column(&vs, data.as_ref());
    let dialog_run_ids: Vec<String> = focused_column
        .map(|column| {
            run_dialog::dialog_runs(column)
                .map(|r| r.run_id.clone())
                .collect()
        })
        .unwrap_or_default();
    let dialog_open = focused_column.is_some();
    let context = if dialog_open {
        ViewContext::Dialog
    } else {
        ViewContext::Matrix
    };

    // Keyboard handling.
    let keybindings = props.keybindings.cloned();
    let engine_kb = engine.clone();
    let event_tx_kb = event_tx.clone();
    let index_kb = index.clone();
    let suggestions_kb = suggestions.clone();
    let selector_kb = selector.clone();
    let partition_set_kb = partition_set.clone();
    let base_url = dagster_cfg.url.clone();
    let store_kb = store.clone();
    hooks.use_terminal_events({
        move |event| match event {
            TerminalEvent::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) if kind != KeyEventKind::Release => {
                // Help overlay: intercept all keys when visible.
                if help_visible.get() {
                    if matches!(code, KeyCode::Char('?') | KeyCode::Esc) {
                        help_visible.set(false);
                    }
                    return;
                }

                if input_mode.get() == InputMode::Search {
                    match code {
                        KeyCode::Esc => {
                            input_mode.set(InputMode::Normal);
                            input_buffer.set(String::new());
                        }
                        KeyCode::Enter => {
                            let mut next = view_state.read().clone();
                            next.step_query = input_buffer.read().trim().to_owned();
                            commit_view_state(&mut view_state, store_kb.as_ref(), next);
                            input_mode.set(InputMode::Normal);
                            input_buffer.set(String::new());
                            row_offset.set(0);
                        }
                        KeyCode::Tab => {
                            let pick = selected_suggestion.unwrap_or(0);
                            if let Some(completion) = suggestions_kb.get(pick) {
                                let completed =
                                    text_input::complete(&input_buffer.read(), completion);
                                input_buffer.set(completed);
                                suggestion_idx.set(None);
                            }
                        }
                        KeyCode::Down if !suggestions_kb.is_empty() => {
                            let next = selected_suggestion
                                .map_or(0, |i| (i + 1) % suggestions_kb.len().min(5));
                            suggestion_idx.set(Some(next));
                        }
                        KeyCode::Up if !suggestions_kb.is_empty() => {
                            let shown = suggestions_kb.len().min(5);
                            let next = selected_suggestion.map_or(shown - 1, |i| {
                                if i == 0 { shown - 1 } else { i - 1 }
                            });
                            suggestion_idx.set(Some(next));
                        }
                        KeyCode::Backspace => {
                            let mut q = input_buffer.read().clone();
                            q.pop();
                            input_buffer.set(q);
                            suggestion_idx.set(None);
                        }
                        KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                            let mut q = input_buffer.read().clone();
                            q.push(ch);
                            input_buffer.set(q);
                            suggestion_idx.set(None);
                        }
                        _ => {}
                    }
                    return;
                }

                let Some(key_str) = key_event_to_string(code, modifiers, kind) else {
                    return;
                };
                let state = view_state.read().clone();
                let here = index_kb.resolve(cursor.read().as_ref());
                let here_sel = here.and_then(|(c, r)| index_kb.selection(c, r));

                // Template variables: the dialog run, or the newest run of the cursor column.
                let run_id = if state.focused.is_some() {
                    dialog_run_ids.get(dialog_cursor.get()).cloned()
                } else {
                    here.and_then(|(c, _)| index_kb.latest_runs.get(c).cloned().flatten())
                };
                let url = run_id
                    .as_deref()
                    .and_then(|id| run_url(&base_url, id))
                    .map(|u| u.to_string());
                let target = state.focused.clone().or_else(|| here_sel.clone());
                let vars = TemplateVars {
                    pipeline: selector_kb.pipeline_name.clone(),
                    partition: target.as_ref().map(|s| s.partition.clone()).unwrap_or_default(),
                    step: target.as_ref().map(|s| s.step.clone()).unwrap_or_default(),
                    run_id: run_id.clone().unwrap_or_default(),
                    url: url.clone().unwrap_or_default(),
                };

                let binding = keybindings.as_ref().and_then(|kb| kb.resolve(&key_str, context));
                let Some(binding) = binding else {
                    return;
                };
                action_status.set(None);

                let mut move_cursor = |columns: isize, rows: isize| {
                    let from = here.unwrap_or((0, 0));
                    if let Some(sel) = index_kb.moved(from, columns, rows)
                        && let Some(column) = index_kb.partitions.iter().position(|p| *p == sel.partition)
                        && let Some(row) = index_kb.steps.iter().position(|s| *s == sel.step)
                    {
                        scroll_offset.set(scroll_to_reveal(
                            scroll,
                            column,
                            geometry.column_width,
                            geometry.body_width,
                        ));
                        row_offset.set(scroll_to_reveal(rows_off, row, 1, visible_rows));
                        cursor.set(Some(sel));
                    }
                };

                match binding {
                    ResolvedBinding::ShellCommand(cmd) => {
                        let expanded = expand_template(&cmd, &vars);
                        match execute_shell_command(&expanded) {
                            Ok(out) if out.is_empty() => {}
                            Ok(out) => action_status.set(Some(out)),
                            Err(e) => action_status.set(Some(format!("Command failed: {e:#}"))),
                        }
                    }
                    ResolvedBinding::Builtin(action) => match action {
                        BuiltinAction::Quit => {
                            if let Some(mut exit) = should_exit {
                                exit.set(true);
                            }
                        }
                        BuiltinAction::ToggleHelp => help_visible.set(true),
                        BuiltinAction::Refresh => {
                            if let Some(ref eng) = engine_kb {
                                if matches!(*pipeline.read(), PipelineLoad::Loading) {
                                    eng.send(Request::FetchPipeline {
                                        selector: selector_kb.clone(),
                                        reply_tx: event_tx_kb.clone(),
                                    });
                                }
                                eng.send(Request::FetchPartitions {
                                    selector: selector_kb.clone(),
                                    partition_set: partition_set_kb.clone(),
                                    force: true,
                                    reply_tx: event_tx_kb.clone(),
                                });
                                loading.set(true);
                            }
                        }
                        BuiltinAction::Search => {
                            input_buffer.set(state.step_query.clone());
                            suggestion_idx.set(None);
                            input_mode.set(InputMode::Search);
                        }

                        // Dialog
                        BuiltinAction::CloseDialog => {
                            let mut next = state;
                            next.focused = None;
                            commit_view_state(&mut view_state, store_kb.as_ref(), next);
                            dialog_cursor.set(0);
                        }
                        BuiltinAction::MoveDown if state.focused.is_some() => {
                            let last = dialog_run_ids.len().saturating_sub(1);
                            dialog_cursor.set((dialog_cursor.get() + 1).min(last));
                        }
                        BuiltinAction::MoveUp if state.focused.is_some() => {
                            dialog_cursor.set(dialog_cursor.get().saturating_sub(1));
                        }
                        BuiltinAction::OpenRun => {
                            if let Some(url) = url {
                                action_status.set(Some(report(
                                    clipboard::open_in_browser(&url),
                                    format!("Opened {url}"),
                                    "Open failed",
                                )));
                            }
                        }
                        BuiltinAction::CopyRunId => {
                            if let Some(id) = run_id {
                                action_status.set(Some(report(
                                    clipboard::copy_to_clipboard(&id),
                                    format!("Copied {id}"),
                                    "Copy failed",
                                )));
                            }
                        }
                        _ if state.focused.is_some() => {}

                        // Matrix
                        BuiltinAction::MoveDown => move_cursor(0, 1),
                        BuiltinAction::MoveUp => move_cursor(0, -1),
                        BuiltinAction::MoveLeft => move_cursor(-1, 0),
                        BuiltinAction::MoveRight => move_cursor(1, 0),
                        BuiltinAction::First => move_cursor(isize::MIN, 0),
                        BuiltinAction::Last => move_cursor(isize::MAX, 0),
                        BuiltinAction::PageLeft | BuiltinAction::PageRight => {
                            let page = isize::try_from(geometry.visible_columns()).unwrap_or(1);
                            let delta = if action == BuiltinAction::PageLeft {
                                -page
                            } else {
                                page
                            };
                            move_cursor(delta, 0);
                        }
                        BuiltinAction::OpenRuns => {
                            // Partitions without runs have nothing to show.
                            if let Some((column, _)) = here
                                && index_kb.has_runs.get(column).copied().unwrap_or(false)
                            {
                                let mut next = state;
                                next.focused = here_sel;
                                commit_view_state(&mut view_state, store_kb.as_ref(), next);
                                dialog_cursor.set(0);
                            }
                        }
                        BuiltinAction::SortTotal | BuiltinAction::SortFinal | BuiltinAction::ClearSort => {
                            let mut next = state;
                            next.sort = match action {
                                BuiltinAction::SortTotal => next.sort.toggle_total(),
                                BuiltinAction::SortFinal => next.sort.toggle_final(),
                                _ => crate::matrix::SortKey::None,
                            };
                            commit_view_state(&mut view_state, store_kb.as_ref(), next);
                        }
                        BuiltinAction::TogglePrevious => {
                            let mut next = state;
                            next.options.show_previous = !next.options.show_previous;
                            commit_view_state(&mut view_state, store_kb.as_ref(), next);
                        }
                        BuiltinAction::ToggleAge => {
                            let mut next = state;
                            next.options.colorize_by_age = !next.options.colorize_by_age;
                            commit_view_state(&mut view_state, store_kb.as_ref(), next);
                        }
                        BuiltinAction::ToggleFailuresOnly => {
                            let mut next = state;
                            next.options.show_failures_and_gaps_only =
                                !next.options.show_failures_and_gaps_only;
                            commit_view_state(&mut view_state, store_kb.as_ref(), next);
                            row_offset.set(0);
                        }
                        BuiltinAction::AgeOlder if state.options.colorize_by_age => {
                            age_threshold.set(age_threshold.get().step_back());
                        }
                        BuiltinAction::AgeNewer if state.options.colorize_by_age => {
                            age_threshold.set(age_threshold.get().step_forward());
                        }
                        BuiltinAction::CopyView => {
                            let query = state.to_query_string();
                            action_status.set(Some(report(
                                clipboard::copy_to_clipboard(&query),
                                format!("Copied view: {query}"),
                                "Copy failed",
                            )));
                        }
                        BuiltinAction::AgeOlder | BuiltinAction::AgeNewer => {}
                    },
                }
            }
            _ => {}
        }
    });

    // -----------------------------------------------------------------------
    // Render
    // -----------------------------------------------------------------------

    let rendered_options = Some(RenderedOptionsBar::build(
        vs.options,
        age_threshold.get(),
        &vs.step_query,
        &theme,
        depth,
    ));

    let placeholder = match &*pipeline.read() {
        PipelineLoad::NotFound(message) => Some(format!("Pipeline not found: {message}")),
        PipelineLoad::Loading => Some(match fetch_error.read().as_ref() {
            Some(err) => format!("Could not load pipeline ({err})"),
            None => "Loading pipeline\u{2026}".to_owned(),
        }),
        PipelineLoad::Ready(_) => None,
    };

    let rendered_matrix = data.as_ref().map(|data| {
        RenderedMatrix::build(&MatrixBuildConfig {
            data,
            sort: vs.sort,
            options: vs.options,
            age_threshold: age_threshold.get(),
            cursor: cursor_pos,
            scroll_offset: scroll,
            row_offset: rows_off,
            visible_rows,
            geometry,
            overscan: usize::from(matrix_cfg.overscan),
            theme: &theme,
            depth,
        })
    });

    let rendered_dialog = vs.focused.as_ref().zip(focused_column).map(|(sel, column)| {
        RenderedRunDialog::build(&RunDialogBuildConfig {
            column,
            step: &sel.step,
            cursor: dialog_cursor.get(),
            date_format: &matrix_cfg.date_format,
            tags: &matrix_cfg.dialog_tags,
            theme: &theme,
            depth,
        })
    });

    let rendered_text_input = (mode == InputMode::Search).then(|| {
        RenderedTextInput::build(
            "steps:",
            &buffer,
            &suggestions,
            selected_suggestion,
            &theme,
            depth,
        )
    });

    let error = fetch_error.read().clone();
    let context_text = if let Some(msg) = action_status.read().as_ref() {
        msg.clone()
    } else if let Some(err) = error.as_ref() {
        format!("Error: {err}")
    } else if loading.get() {
        "Fetching partitions\u{2026}".to_owned()
    } else if let Some((column, row)) = cursor_pos {
        let status = data
            .as_ref()
            .and_then(|d| d.cell(column, row))
            .map_or("", |cell| cell.history.label());
        format!(
            "Partition {}/{} \u{00b7} {} \u{00b7} {status}",
            column + 1,
            index.partitions.len(),
            index.steps.get(row).map_or("", String::as_str)
        )
    } else {
        format!("{} partitions", index.partitions.len())
    };
    let rendered_footer = Some(RenderedFooter::build(
        format!("{} \u{00b7} {}", selector.pipeline_name, partition_set),
        context_text,
        footer::format_updated_ago(*fetched_at.read(), Utc::now()),
        error.is_some() && action_status.read().is_none(),
        &theme,
        depth,
    ));

    let rendered_help = if help_visible.get() {
        props.keybindings.map(|kb| {
            RenderedHelpOverlay::build(&HelpOverlayBuildConfig {
                bindings: kb,
                context,
                theme: &theme,
                depth,
            })
        })
    } else {
        None
    };

    let faint_fg = theme.text_faint.to_crossterm_color(depth);
    let width = u32::from(props.width);
    let height = u32::from(props.height);

    element! {
        View(flex_direction: FlexDirection::Column, width, height) {
            OptionsBar(bar: rendered_options)

            View(flex_grow: 1.0, flex_direction: FlexDirection::Column, overflow: Overflow::Hidden) {
                #(placeholder.into_iter().map(|msg| {
                    element! {
                        View(padding_left: 2, padding_top: 1) {
                            Text(content: msg, color: faint_fg)
                        }
                    }
                }))
                MatrixGrid(matrix: rendered_matrix)
            }

            TextInput(input: rendered_text_input)
            Footer(footer: rendered_footer)
            RunDialog(dialog: rendered_dialog, width: props.width, height: props.height)
            HelpOverlay(overlay: rendered_help, width: props.width, height: props.height)
        }
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::StepRow;
    use crate::types::Run;

    fn index() -> GridIndex {
        let column = |name: &str, runs: usize| PartitionColumn {
            name: name.to_owned(),
            runs: (0..runs)
                .map(|i| Run {
                    run_id: format!("{name}-run-{i}"),
                    tags: vec![],
                    start_time: None,
                    step_stats: vec![],
                })
                .collect(),
            steps: vec![],
        };
        let row = |name: &str, idx: usize| StepRow {
            name: name.to_owned(),
            depth: 0,
            graph_index: idx,
            total_failure_percent: 0,
            final_failure_percent: 0,
        };
        GridIndex::from_data(&MatrixData {
            rows: vec![row("extract", 0), row("load", 1)],
            columns: vec![column("p1", 0), column("p2", 2), column("p3", 1)],
        })
    }

    fn sel(partition: &str, step: &str) -> Selection {
        Selection {
            partition: partition.to_owned(),
            step: step.to_owned(),
        }
    }

    #[test]
    fn cursor_defaults_to_newest_partition() {
        assert_eq!(index().resolve(None), Some((2, 0)));
        assert_eq!(index().resolve(Some(&sel("gone", "load"))), Some((2, 1)));
        assert_eq!(GridIndex::default().resolve(None), None);
    }

    #[test]
    fn dialog_needs_a_built_grid() {
        let state = ViewState {
            focused: Some(sel("p2", "load")),
            ..ViewState::default()
        };
        let data = MatrixData {
            rows: vec![],
            columns: vec![PartitionColumn {
                name: "p2".to_owned(),
                runs: vec![],
                steps: vec![],
            }],
        };
        // Restored focus while the pipeline is still loading.
        assert!(dialog_column(&state, None).is_none());
        assert_eq!(dialog_column(&state, Some(&data)).map(|c| c.name.as_str()), Some("p2"));
        assert!(dialog_column(&ViewState::default(), Some(&data)).is_none());
    }

    #[test]
    fn cursor_follows_names() {
        assert_eq!(index().resolve(Some(&sel("p1", "load"))), Some((0, 1)));
    }

    #[test]
    fn moves_are_clamped() {
        let idx = index();
        assert_eq!(idx.moved((2, 1), 1, 1), Some(sel("p3", "load")));
        assert_eq!(idx.moved((0, 0), -1, -1), Some(sel("p1", "extract")));
        assert_eq!(idx.moved((1, 0), isize::MIN, 0), Some(sel("p1", "extract")));
        assert_eq!(idx.moved((1, 0), isize::MAX, 0), Some(sel("p3", "extract")));
    }

    #[test]
    fn latest_run_is_last_in_start_order() {
        let idx = index();
        assert_eq!(idx.latest_runs[0], None);
        assert_eq!(idx.latest_runs[1].as_deref(), Some("p2-run-1"));
        assert_eq!(idx.has_runs, vec![false, true, true]);
    }
}
