use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

use crate::matrix::{MatrixData, SortKey};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// User toggles above the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayOptions {
    /// Show compound history colors instead of the latest outcome only.
    pub show_previous: bool,
    pub colorize_by_age: bool,
    /// Hide steps that succeeded cleanly in every partition with runs.
    pub show_failures_and_gaps_only: bool,
}

/// One cell, addressed by names so it survives re-sorting and refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub partition: String,
    pub step: String,
}

/// Everything about the matrix view that survives leaving and coming back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub sort: SortKey,
    pub options: DisplayOptions,
    /// Cell whose run dialog is open.
    pub focused: Option<Selection>,
    pub step_query: String,
}

const KEY_SHOW_PREVIOUS: &str = "showPrevious";
const KEY_COLORIZE_BY_AGE: &str = "colorizeByAge";
const KEY_FAILURES_ONLY: &str = "showFailuresAndGapsOnly";
const KEY_SORT: &str = "stepSort";
const KEY_PARTITION: &str = "partition";
const KEY_STEP: &str = "step";
const KEY_STEPS: &str = "steps";

fn parse_flag(value: Option<&String>) -> bool {
    matches!(value.map(String::as_str), Some("true" | "1"))
}

impl ViewState {
    /// Flat parameter map holding only the values that differ from the defaults.
    pub fn encode(&self) -> IndexMap<String, String> {
        let mut map = IndexMap::new();
        let mut flag = |key: &str, on: bool| {
            if on {
                map.insert(key.to_owned(), "true".to_owned());
            }
        };
        flag(KEY_SHOW_PREVIOUS, self.options.show_previous);
        flag(KEY_COLORIZE_BY_AGE, self.options.colorize_by_age);
        flag(KEY_FAILURES_ONLY, self.options.show_failures_and_gaps_only);

        if self.sort != SortKey::None {
            map.insert(KEY_SORT.to_owned(), self.sort.as_str().to_owned());
        }
        if let Some(sel) = &self.focused {
            map.insert(KEY_PARTITION.to_owned(), sel.partition.clone());
            map.insert(KEY_STEP.to_owned(), sel.step.clone());
        }
        if !self.step_query.trim().is_empty() {
            map.insert(KEY_STEPS.to_owned(), self.step_query.trim().to_owned());
        }
        map
    }

    /// Rebuild state from a parameter map.
    ///
    /// Never fails: unknown keys are ignored and missing or malformed values
    /// fall back to the defaults. A selection needs both `partition` and
    /// `step`.
    pub fn decode(map: &IndexMap<String, String>) -> Self {
        let focused = match (map.get(KEY_PARTITION), map.get(KEY_STEP)) {
            (Some(partition), Some(step)) if !partition.is_empty() && !step.is_empty() => {
                Some(Selection {
                    partition: partition.clone(),
                    step: step.clone(),
                })
            }
            _ => None,
        };
        Self {
            sort: map
                .get(KEY_SORT)
                .and_then(|s| SortKey::parse(s))
                .unwrap_or_default(),
            options: DisplayOptions {
                show_previous: parse_flag(map.get(KEY_SHOW_PREVIOUS)),
                colorize_by_age: parse_flag(map.get(KEY_COLORIZE_BY_AGE)),
                show_failures_and_gaps_only: parse_flag(map.get(KEY_FAILURES_ONLY)),
            },
            focused,
            step_query: map.get(KEY_STEPS).cloned().unwrap_or_default(),
        }
    }

    /// `key=value&...` form, as used by `--view` and the state file.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.encode().iter())
            .finish()
    }

    /// The state to commit when the focused partition is gone from `data`.
    ///
    /// `None` means nothing changes. Before the first partitions fetch
    /// (`loaded == false`) or while no matrix is built, a restored focus is
    /// kept so it can resolve once data arrives.
    pub fn reconcile_focus(&self, data: Option<&MatrixData>, loaded: bool) -> Option<ViewState> {
        let focused = self.focused.as_ref()?;
        let data = data.filter(|_| loaded)?;
        if data.column_index(&focused.partition).is_some() {
            return None;
        }
        tracing::debug!(partition = %focused.partition, "focused partition vanished");
        Some(ViewState {
            focused: None,
            ..self.clone()
        })
    }

    pub fn from_query_string(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let map: IndexMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self::decode(&map)
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ViewStateError {
    #[error("no state directory: neither $XDG_STATE_HOME nor $HOME is set")]
    NoStateDir,
    #[error("writing view state to {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// View state file for one pipeline.
#[derive(Debug, Clone)]
pub struct ViewStateStore {
    path: PathBuf,
}

impl ViewStateStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under `$XDG_STATE_HOME/partition-matrix/` (or `~/.local/state/...`),
    /// named after `key`.
    pub fn for_key(key: &str) -> Result<Self, ViewStateError> {
        let base = std::env::var_os("XDG_STATE_HOME")
            .map(PathBuf::from)
            .filter(|p| p.is_absolute())
            .or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/state"))
            })
            .ok_or(ViewStateError::NoStateDir)?;
        Ok(Self::at(
            base.join("partition-matrix")
                .join(format!("{}.view", sanitize_file_stem(key))),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last saved state, or the defaults when the file is missing or unreadable.
    pub fn load(&self) -> ViewState {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => ViewState::from_query_string(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ViewState::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring unreadable view state: {e}");
                ViewState::default()
            }
        }
    }

    pub fn save(&self, state: &ViewState) -> Result<(), ViewStateError> {
        let write_err = |source| ViewStateError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&self.path, state.to_query_string()).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), "saved view state");
        Ok(())
    }
}

fn sanitize_file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
