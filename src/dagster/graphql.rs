use anyhow::{Result, bail};
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::dagster::client::DagsterClient;
use crate::types::{
    Partition, PipelineSelector, PipelineSnapshot, PipelineSnapshotOrError, Run, RunTag,
    StepEventStatus, StepHandle, StepStats,
};

// ---------------------------------------------------------------------------
// GraphQL query strings
// ---------------------------------------------------------------------------

const PIPELINE_STEP_GRAPH_QUERY: &str = r#"
query PartitionMatrixStepGraph($pipelineSelector: PipelineSelector!) {
  pipelineSnapshotOrError(activePipelineSelector: $pipelineSelector) {
    __typename
    ... on PipelineSnapshot {
      name
      solidHandles(parentHandleID: "") {
        handleID
        solid {
          name
          inputs { dependsOn { solid { name } } }
          outputs { dependedBy { solid { name } } }
        }
      }
    }
    ... on PipelineNotFoundError { message }
    ... on PythonError { message }
  }
}
"#;

const PARTITION_RUNS_QUERY: &str = r"
query PartitionMatrixRuns(
  $partitionSetName: String!
  $repositorySelector: RepositorySelector!
  $limit: Int
) {
  partitionSetOrError(
    partitionSetName: $partitionSetName
    repositorySelector: $repositorySelector
  ) {
    __typename
    ... on PartitionSet {
      name
      partitionsOrError(limit: $limit, reverse: true) {
        __typename
        ... on Partitions {
          results {
            name
            runs {
              runId
              tags { key value }
              stats {
                __typename
                ... on PipelineRunStatsSnapshot { startTime }
              }
              stepStats {
                stepKey
                status
                materializations { __typename }
                expectationResults { success }
              }
            }
          }
        }
        ... on PythonError { message }
      }
    }
    ... on PartitionSetNotFoundError { message }
    ... on PythonError { message }
  }
}
";

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawPipelineSelector<'a> {
    repository_location_name: &'a str,
    repository_name: &'a str,
    pipeline_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawRepositorySelector<'a> {
    repository_location_name: &'a str,
    repository_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StepGraphVariables<'a> {
    pipeline_selector: RawPipelineSelector<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PartitionRunsVariables<'a> {
    partition_set_name: &'a str,
    repository_selector: RawRepositorySelector<'a>,
    limit: u32,
}

// ---------------------------------------------------------------------------
// Response types (mirror the GraphQL response shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct StepGraphData {
    #[serde(rename = "pipelineSnapshotOrError")]
    pipeline_snapshot_or_error: RawPipelineSnapshotOrError,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum RawPipelineSnapshotOrError {
    PipelineSnapshot {
        #[serde(rename = "solidHandles", default)]
        solid_handles: Vec<RawSolidHandle>,
    },
    PipelineNotFoundError {
        message: String,
    },
    PythonError {
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawSolidHandle {
    solid: RawSolid,
}

#[derive(Debug, Deserialize)]
struct RawSolid {
    name: String,
    #[serde(default)]
    inputs: Vec<RawInput>,
    #[serde(default)]
    outputs: Vec<RawOutput>,
}

#[derive(Debug, Deserialize)]
struct RawInput {
    #[serde(rename = "dependsOn", default)]
    depends_on: Vec<RawSolidRef>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    #[serde(rename = "dependedBy", default)]
    depended_by: Vec<RawSolidRef>,
}

#[derive(Debug, Deserialize)]
struct RawSolidRef {
    solid: RawSolidName,
}

#[derive(Debug, Deserialize)]
struct RawSolidName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PartitionRunsData {
    #[serde(rename = "partitionSetOrError")]
    partition_set_or_error: RawPartitionSetOrError,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum RawPartitionSetOrError {
    PartitionSet {
        #[serde(rename = "partitionsOrError")]
        partitions_or_error: RawPartitionsOrError,
    },
    PartitionSetNotFoundError {
        message: String,
    },
    PythonError {
        message: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum RawPartitionsOrError {
    Partitions {
        #[serde(default)]
        results: Vec<RawPartition>,
    },
    PythonError {
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct RawPartition {
    name: String,
    #[serde(default)]
    runs: Vec<RawRun>,
}

#[derive(Debug, Deserialize)]
struct RawRun {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(default)]
    tags: Vec<RunTag>,
    stats: Option<RawRunStats>,
    #[serde(rename = "stepStats", default)]
    step_stats: Vec<RawStepStats>,
}

/// `PipelineRunStatsSnapshot | PythonError`; only the former has a start time.
#[derive(Debug, Deserialize)]
struct RawRunStats {
    #[serde(rename = "startTime", default)]
    start_time: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawStepStats {
    #[serde(rename = "stepKey")]
    step_key: String,
    status: Option<StepEventStatus>,
    #[serde(default)]
    materializations: Vec<serde::de::IgnoredAny>,
    #[serde(rename = "expectationResults", default)]
    expectation_results: Vec<RawExpectationResult>,
}

#[derive(Debug, Deserialize)]
struct RawExpectationResult {
    success: bool,
}

// ---------------------------------------------------------------------------
// Raw -> domain
// ---------------------------------------------------------------------------

impl RawSolidHandle {
    fn into_domain(self) -> StepHandle {
        let RawSolid {
            name,
            inputs,
            outputs,
        } = self.solid;
        StepHandle {
            name,
            depends_on: inputs
                .into_iter()
                .flat_map(|i| i.depends_on)
                .map(|r| r.solid.name)
                .collect(),
            depended_by: outputs
                .into_iter()
                .flat_map(|o| o.depended_by)
                .map(|r| r.solid.name)
                .collect(),
        }
    }
}

impl RawRun {
    fn into_domain(self) -> Run {
        Run {
            run_id: self.run_id,
            tags: self.tags,
            start_time: self.stats.and_then(|s| s.start_time),
            step_stats: self
                .step_stats
                .into_iter()
                .map(|s| StepStats {
                    step_key: s.step_key,
                    status: s.status,
                    materializations: s.materializations.len(),
                    expectation_results: s.expectation_results.into_iter().map(|e| e.success).collect(),
                })
                .collect(),
        }
    }
}

impl RawPartition {
    fn into_domain(self) -> Partition {
        Partition {
            name: self.name,
            runs: self.runs.into_iter().map(RawRun::into_domain).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Fetch the step graph of a pipeline.
///
/// A missing pipeline is a regular result, not an error; transport and
/// server-side errors are.
pub async fn fetch_pipeline_snapshot(
    client: &DagsterClient,
    selector: &PipelineSelector,
) -> Result<PipelineSnapshotOrError> {
    let variables = StepGraphVariables {
        pipeline_selector: RawPipelineSelector {
            repository_location_name: &selector.repository_location_name,
            repository_name: &selector.repository_name,
            pipeline_name: &selector.pipeline_name,
        },
    };
    let data: StepGraphData = client
        .execute("PartitionMatrixStepGraph", PIPELINE_STEP_GRAPH_QUERY, variables)
        .await?;

    match data.pipeline_snapshot_or_error {
        RawPipelineSnapshotOrError::PipelineSnapshot { solid_handles } => {
            Ok(PipelineSnapshotOrError::Snapshot(PipelineSnapshot {
                steps: solid_handles
                    .into_iter()
                    .map(RawSolidHandle::into_domain)
                    .collect(),
            }))
        }
        RawPipelineSnapshotOrError::PipelineNotFoundError { message } => {
            Ok(PipelineSnapshotOrError::NotFound { message })
        }
        RawPipelineSnapshotOrError::PythonError { message } => {
            bail!("server error loading {}: {message}", selector.display_name())
        }
    }
}

/// Fetch up to `limit` of the most recent partitions of a partition set,
/// oldest first, with all their runs.
///
/// When a `cache` is provided, results are served from the moka cache if a
/// fresh entry exists.
pub async fn fetch_partitions(
    client: &DagsterClient,
    selector: &PipelineSelector,
    partition_set: &str,
    limit: u32,
    cache: Option<&Cache<String, String>>,
) -> Result<Vec<Partition>> {
    let cache_key = format!("partitions:{}:{partition_set}:{limit}", selector.display_name());

    if let Some(c) = cache
        && let Some(cached) = c.get(&cache_key).await
        && let Ok(partitions) = serde_json::from_str::<Vec<Partition>>(&cached)
    {
        tracing::debug!("cache hit for {cache_key}");
        return Ok(partitions);
    }

    let variables = PartitionRunsVariables {
        partition_set_name: partition_set,
        repository_selector: RawRepositorySelector {
            repository_location_name: &selector.repository_location_name,
            repository_name: &selector.repository_name,
        },
        limit,
    };
    let data: PartitionRunsData = client
        .execute("PartitionMatrixRuns", PARTITION_RUNS_QUERY, variables)
        .await?;

    let results = match data.partition_set_or_error {
        RawPartitionSetOrError::PartitionSet {
            partitions_or_error: RawPartitionsOrError::Partitions { results },
        } => results,
        RawPartitionSetOrError::PartitionSet {
            partitions_or_error: RawPartitionsOrError::PythonError { message },
        }
        | RawPartitionSetOrError::PythonError { message } => {
            bail!("server error loading partition set {partition_set:?}: {message}")
        }
        RawPartitionSetOrError::PartitionSetNotFoundError { message } => {
            bail!("partition set {partition_set:?} not found: {message}")
        }
    };

    // The server returns newest first.
    let partitions: Vec<Partition> = results
        .into_iter()
        .rev()
        .map(RawPartition::into_domain)
        .collect();

    if let Some(c) = cache
        && let Ok(json) = serde_json::to_string(&partitions)
    {
        c.insert(cache_key, json).await;
    }

    Ok(partitions)
}
