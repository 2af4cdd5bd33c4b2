use std::time::Duration;

use anyhow::{Context, Result, bail};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::types::DagsterConfig;

#[derive(Serialize)]
struct GraphQLPayload<V: Serialize> {
    query: &'static str,
    variables: V,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<D> {
    data: Option<D>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

/// GraphQL client for one Dagster web server, with a TTL cache for
/// partition results.
#[derive(Clone)]
pub struct DagsterClient {
    http: reqwest::Client,
    endpoint: Url,
    cache: Cache<String, String>,
}

impl DagsterClient {
    pub fn new(config: &DagsterConfig) -> Result<Self> {
        let web_base = parse_base_url(&config.url)?;
        let endpoint = graphql_endpoint(&web_base)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .user_agent(concat!("partition-matrix/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building HTTP client")?;
        let cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(Duration::from_secs(u64::from(config.cache_ttl_minutes) * 60))
            .build();
        tracing::debug!(%endpoint, "dagster client ready");
        Ok(Self {
            http,
            endpoint,
            cache,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Return a clone of the internal cache (Arc-backed, cheap to clone).
    pub fn cache(&self) -> Cache<String, String> {
        self.cache.clone()
    }

    /// POST a query and return its `data`, failing on transport errors,
    /// non-2xx statuses and GraphQL `errors`.
    pub(crate) async fn execute<V, D>(&self, operation: &str, query: &'static str, variables: V) -> Result<D>
    where
        V: Serialize,
        D: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&GraphQLPayload { query, variables })
            .send()
            .await
            .with_context(|| format!("sending {operation} to {}", self.endpoint))?
            .error_for_status()
            .with_context(|| format!("{operation} rejected by {}", self.endpoint))?;

        let body: GraphQLResponse<D> = response
            .json()
            .await
            .with_context(|| format!("decoding {operation} response"))?;

        if let Some(errors) = body.errors
            && !errors.is_empty()
        {
            let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
            bail!("GraphQL errors in {operation}: {}", messages.join("; "));
        }
        body.data
            .with_context(|| format!("{operation} response missing data field"))
    }
}

/// Page of a run in the web UI served at `base_url`.
pub fn run_url(base_url: &str, run_id: &str) -> Option<Url> {
    parse_base_url(base_url)
        .ok()?
        .join(&format!("instance/runs/{run_id}"))
        .ok()
}

/// Base URL with a trailing slash so relative joins append instead of replace.
fn parse_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix("/graphql").unwrap_or(trimmed);
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };
    Url::parse(&with_slash).with_context(|| format!("invalid dagster url {raw:?}"))
}

fn graphql_endpoint(base: &Url) -> Result<Url> {
    base.join("graphql")
        .with_context(|| format!("building GraphQL endpoint from {base}"))
}
