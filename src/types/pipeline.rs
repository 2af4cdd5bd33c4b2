use serde::{Deserialize, Serialize};

/// Identifies one pipeline inside a code repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PipelineSelector {
    pub repository_location_name: String,
    pub repository_name: String,
    pub pipeline_name: String,
}

impl PipelineSelector {
    /// `pipeline@repository:location`, used in the footer and in cache keys.
    pub fn display_name(&self) -> String {
        format!(
            "{}@{}:{}",
            self.pipeline_name, self.repository_name, self.repository_location_name
        )
    }
}

/// A node in the pipeline's dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepHandle {
    pub name: String,
    /// Names of the steps feeding this step's inputs.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Names of the steps consuming this step's outputs.
    #[serde(default)]
    pub depended_by: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub steps: Vec<StepHandle>,
}

/// Result of the pipeline structure query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineSnapshotOrError {
    Snapshot(PipelineSnapshot),
    NotFound { message: String },
}
