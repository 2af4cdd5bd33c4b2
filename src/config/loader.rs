use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::types::AppConfig;

/// Discover and load the app config.
///
/// Priority:
/// 1. `--config` flag (explicit path)
/// 2. `$PARTITION_MATRIX_CONFIG` environment variable
/// 3. `$XDG_CONFIG_HOME/partition-matrix/config.toml`
/// 4. `~/.config/partition-matrix/config.toml`
///
/// Falls back to defaults when nothing is found. An explicit path that does
/// not exist is an error.
pub fn load_config(explicit_path: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit_path {
        Some(path) => Some(path.to_path_buf()),
        None => find_config(),
    };
    let Some(path) = path else {
        tracing::debug!("no config file found, using defaults");
        return Ok(AppConfig::default());
    };
    load_from(&path)
}

/// Parse a single config file.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML from {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn find_config() -> Option<PathBuf> {
    // $PARTITION_MATRIX_CONFIG
    if let Ok(path) = std::env::var("PARTITION_MATRIX_CONFIG") {
        let p = expand_tilde(&path);
        if p.is_file() {
            return Some(p);
        }
    }

    // $XDG_CONFIG_HOME/partition-matrix/config.toml
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        let p = PathBuf::from(xdg).join("partition-matrix/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    // ~/.config/partition-matrix/config.toml
    if let Some(home) = home_dir() {
        let p = home.join(".config/partition-matrix/config.toml");
        if p.is_file() {
            return Some(p);
        }
    }

    None
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
