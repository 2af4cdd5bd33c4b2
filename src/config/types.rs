use serde::Deserialize;

use crate::color::Color;
use crate::config::keybindings::KeybindingsConfig;
use crate::types::PipelineSelector;

// ---------------------------------------------------------------------------
// Custom Color deserialization
// ---------------------------------------------------------------------------

/// Deserialize an `Option<Color>` from a TOML string value.
pub(crate) mod color_de {
    use serde::{self, Deserialize, Deserializer};

    use crate::color::Color;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Color>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            None => Ok(None),
            Some(s) => Color::parse(&s, "<theme>")
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dagster: DagsterConfig,
    pub matrix: MatrixConfig,
    pub theme: Theme,
    pub keybindings: KeybindingsConfig,
}

// ---------------------------------------------------------------------------
// Remote instance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DagsterConfig {
    /// Base URL of the web server; `/graphql` is appended when missing.
    pub url: String,
    pub repository_location_name: String,
    pub repository_name: String,
    pub pipeline_name: String,
    pub partition_set_name: String,
    /// Maximum number of partitions fetched, newest last.
    pub partition_limit: u32,
    pub refetch_interval_minutes: u32,
    pub cache_ttl_minutes: u32,
    pub request_timeout_secs: u64,
}

impl Default for DagsterConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_owned(),
            repository_location_name: String::new(),
            repository_name: String::new(),
            pipeline_name: String::new(),
            partition_set_name: String::new(),
            partition_limit: 300,
            refetch_interval_minutes: 5,
            cache_ttl_minutes: 1,
            request_timeout_secs: 30,
        }
    }
}

impl DagsterConfig {
    pub fn selector(&self) -> PipelineSelector {
        PipelineSelector {
            repository_location_name: self.repository_location_name.clone(),
            repository_name: self.repository_name.clone(),
            pipeline_name: self.pipeline_name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Matrix layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatrixConfig {
    /// Width of one partition column in terminal cells.
    pub column_width: u16,
    /// Extra cells rendered on each side of the visible area.
    pub overscan: u16,
    /// Width of the step name column.
    pub label_width: u16,
    /// `strftime` format for run start times, or `"relative"`.
    pub date_format: String,
    /// Run tags shown in the run dialog.
    pub dialog_tags: Vec<String>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            column_width: 3,
            overscan: 9,
            label_width: 32,
            date_format: "%Y-%m-%d %H:%M".to_owned(),
            dialog_tags: vec!["dagster/backfill".to_owned(), "dagster/schedule_name".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub colors: ColorsTheme,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColorsTheme {
    pub text: TextColors,
    pub background: BgColors,
    pub border: BorderColors,
    pub status: StatusColors,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextColors {
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub primary: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub secondary: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub faint: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub warning: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub success: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub error: Option<Color>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BgColors {
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub selected: Option<Color>,
    /// Terminal background, the target faded cells are blended toward.
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub base: Option<Color>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BorderColors {
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub primary: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub faint: Option<Color>,
}

/// One slot per matrix cell color.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StatusColors {
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub success: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub failure: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub skipped: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub in_progress: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub missing: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub failure_success: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub failure_skipped: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub failure_missing: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub success_missing: Option<Color>,
    #[serde(default, deserialize_with = "color_de::deserialize")]
    pub skipped_missing: Option<Color>,
}
