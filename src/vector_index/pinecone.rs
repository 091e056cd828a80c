//! Pinecone serverless index client over the REST API.

use super::{IndexSpec, IndexStatus, QueryMatch, VectorIndex};
use crate::config::{Settings, VectorIndexSettings};
use crate::error::{RagchatError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Client for one Pinecone index.
pub struct PineconeIndex {
    http: reqwest::Client,
    api_key: String,
    api_version: String,
    control_url: Url,
    index_name: String,
    ready_poll_attempts: u32,
    ready_poll_interval: Duration,
    /// Data plane host, resolved on bootstrap or on first query.
    host: OnceCell<Url>,
}

#[derive(Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'a str,
    spec: CreateIndexSpec<'a>,
}

#[derive(Serialize)]
struct CreateIndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    dimension: usize,
    metric: String,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: Option<IndexState>,
}

#[derive(Debug, Deserialize)]
struct IndexState {
    ready: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_values: bool,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

impl PineconeIndex {
    /// Create a client using the API key from the environment.
    pub fn from_settings(settings: &VectorIndexSettings) -> Result<Self> {
        let api_key = Settings::pinecone_api_key()?;
        Self::new(api_key, settings)
    }

    /// Create a client with an explicit API key.
    pub fn new(api_key: String, settings: &VectorIndexSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| {
                RagchatError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        let control_url = parse_base_url(&settings.control_url)?;

        Ok(Self {
            http,
            api_key,
            api_version: settings.api_version.clone(),
            control_url,
            index_name: settings.index_name.clone(),
            ready_poll_attempts: settings.ready_poll_attempts,
            ready_poll_interval: Duration::from_millis(settings.ready_poll_interval_ms),
            host: OnceCell::new(),
        })
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }

    fn control_endpoint(&self, path: &str) -> Result<Url> {
        self.control_url
            .join(path)
            .map_err(|e| RagchatError::Configuration(format!("Invalid control URL: {}", e)))
    }

    /// Describe an index; `None` when it does not exist.
    async fn describe(&self, name: &str) -> Result<Option<IndexDescription>> {
        let url = self.control_endpoint(&format!("indexes/{}", name))?;
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| RagchatError::VectorIndex(format!("Describe index failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let description = response.json::<IndexDescription>().await.map_err(|e| {
                    RagchatError::VectorIndex(format!("Unexpected describe response: {}", e))
                })?;
                Ok(Some(description))
            }
            status => Err(api_error("Describe index", status, response).await),
        }
    }

    /// Create an index; a conflict means another process won the race.
    async fn create(&self, spec: &IndexSpec) -> Result<IndexStatus> {
        let url = self.control_endpoint("indexes")?;
        let body = CreateIndexRequest {
            name: &spec.name,
            dimension: spec.dimension,
            metric: &spec.metric,
            spec: CreateIndexSpec {
                serverless: ServerlessSpec {
                    cloud: &spec.cloud,
                    region: &spec.region,
                },
            },
        };

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagchatError::VectorIndex(format!("Create index failed: {}", e)))?;

        match response.status() {
            StatusCode::CONFLICT => {
                info!("Index {} was created concurrently, using it", spec.name);
                Ok(IndexStatus::Existing)
            }
            status if status.is_success() => {
                info!("Created index {}", spec.name);
                Ok(IndexStatus::Created)
            }
            status => Err(api_error("Create index", status, response).await),
        }
    }

    /// Poll until the index reports ready; returns its description and data plane host.
    async fn wait_until_ready(&self, name: &str) -> Result<(IndexDescription, Url)> {
        let attempts = self.ready_poll_attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(description) = self.describe(name).await? {
                let ready = description.status.as_ref().map_or(true, |s| s.ready);
                if ready {
                    if let Some(host) = description.host.as_deref().map(parse_host).transpose()? {
                        return Ok((description, host));
                    }
                }
            }
            debug!("Index {} not ready yet (attempt {}/{})", name, attempt, attempts);
            if attempt < attempts {
                tokio::time::sleep(self.ready_poll_interval).await;
            }
        }

        Err(RagchatError::VectorIndex(format!(
            "Index {} did not become ready",
            name
        )))
    }

    async fn resolve_host(&self) -> Result<Url> {
        match self.describe(&self.index_name).await? {
            Some(IndexDescription {
                host: Some(host), ..
            }) => parse_host(&host),
            Some(_) => Err(RagchatError::VectorIndex(format!(
                "Index {} has no host yet",
                self.index_name
            ))),
            None => Err(RagchatError::VectorIndex(format!(
                "Index {} does not exist",
                self.index_name
            ))),
        }
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    #[instrument(skip(self, spec), fields(index = %spec.name))]
    async fn ensure_index(&self, spec: &IndexSpec) -> Result<IndexStatus> {
        let status = match self.describe(&spec.name).await? {
            Some(existing) => {
                check_shape(spec, &existing)?;
                info!("Using existing index {}", spec.name);
                IndexStatus::Existing
            }
            None => self.create(spec).await?,
        };

        // A conflicting create means someone else chose the shape
        let (description, host) = self.wait_until_ready(&spec.name).await?;
        check_shape(spec, &description)?;

        if spec.name == self.index_name && self.host.set(host).is_err() {
            debug!("Data plane host already resolved");
        }

        Ok(status)
    }

    #[instrument(skip(self, vector), fields(dims = vector.len()))]
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let host = self.host.get_or_try_init(|| self.resolve_host()).await?;
        let url = host
            .join("query")
            .map_err(|e| RagchatError::VectorIndex(format!("Invalid index host: {}", e)))?;

        let body = QueryRequest {
            vector,
            top_k,
            include_values: false,
            include_metadata: false,
        };

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagchatError::VectorIndex(format!("Query failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error("Query", status, response).await);
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| RagchatError::VectorIndex(format!("Unexpected query response: {}", e)))?;

        debug!("Index returned {} matches", parsed.matches.len());
        Ok(parsed.matches)
    }
}

/// An existing index must match the expected dimension and metric.
fn check_shape(spec: &IndexSpec, description: &IndexDescription) -> Result<()> {
    if description.dimension != spec.dimension || description.metric != spec.metric {
        return Err(RagchatError::Configuration(format!(
            "Index {} has dimension {} and metric {}, expected {} and {}",
            spec.name, description.dimension, description.metric, spec.dimension, spec.metric
        )));
    }
    Ok(())
}

async fn api_error(operation: &str, status: StatusCode, response: reqwest::Response) -> RagchatError {
    let body = response.text().await.unwrap_or_default();
    warn!("{} returned {}: {}", operation, status, body);
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return RagchatError::Configuration(format!(
            "{} rejected the API key ({})",
            operation, status
        ));
    }
    RagchatError::VectorIndex(format!("{} returned {}: {}", operation, status, body))
}

/// Parse a base URL so that `join` appends to its path.
fn parse_base_url(raw: &str) -> Result<Url> {
    let normalized = format!("{}/", raw.trim_end_matches('/'));
    Url::parse(&normalized)
        .map_err(|e| RagchatError::Configuration(format!("Invalid URL {}: {}", raw, e)))
}

/// Index hosts are reported without a scheme.
fn parse_host(host: &str) -> Result<Url> {
    if host.starts_with("http://") || host.starts_with("https://") {
        parse_base_url(host)
    } else {
        parse_base_url(&format!("https://{}", host))
    }
}
