//! Pinecone vector store provider
//!
//! Resolves the index data-plane host through the control plane once, then
//! issues `query` and `vectors/upsert` calls against it.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result, Stage};
use crate::retrieval::SourceFilter;
use crate::types::{ChunkRecord, Match, MatchMetadata};

use super::http::{build_client, read_json};
use super::vector_store::VectorStoreProvider;

const API_VERSION: &str = "2024-07";
const UPSERT_BATCH: usize = 100;
const INDEX_READY_POLLS: u32 = 60;
const INDEX_READY_INTERVAL: Duration = Duration::from_secs(1);

/// Pinecone index client
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    index: String,
    control_plane_url: String,
    cloud: String,
    region: String,
    /// Data plane base URL, resolved on first use unless configured
    host: OnceCell<String>,
}

impl PineconeIndex {
    /// Create a client for the configured index. Fails if no API key is set.
    pub fn new(config: &VectorDbConfig, timeout: Duration) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::config("PINECONE_API_KEY missing"))?;

        if config.index.trim().is_empty() {
            return Err(Error::config("Pinecone index name missing"));
        }

        let host = match &config.host {
            Some(host) => OnceCell::new_with(Some(normalize_host(host))),
            None => OnceCell::new(),
        };

        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            index: config.index.clone(),
            control_plane_url: config.control_plane_url.trim_end_matches('/').to_string(),
            cloud: config.cloud.clone(),
            region: config.region.clone(),
            host,
        })
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn describe(&self, stage: Stage) -> Result<IndexDescription> {
        let url = format!("{}/indexes/{}", self.control_plane_url, self.index);
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::upstream(stage, format!("Pinecone describe_index failed: {}", e)))?;

        read_json(response, stage, "Pinecone describe_index").await
    }

    /// Data plane base URL for the index
    async fn host(&self, stage: Stage) -> Result<&str> {
        self.host
            .get_or_try_init(move || async move {
                let described = self.describe(stage).await?;
                tracing::info!("Resolved Pinecone index {} at {}", self.index, described.host);
                Ok::<_, Error>(normalize_host(&described.host))
            })
            .await
            .map(String::as_str)
    }

    /// Create the serverless index if the project lacks it, then wait until
    /// it reports ready. A configured host is assumed to exist already.
    pub async fn ensure_index(&self, dimensions: usize) -> Result<()> {
        if self.host.initialized() {
            return Ok(());
        }

        let url = format!("{}/indexes", self.control_plane_url);
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(|e| Error::upstream(Stage::Upsert, format!("Pinecone list_indexes failed: {}", e)))?;
        let listed: IndexList = read_json(response, Stage::Upsert, "Pinecone list_indexes").await?;

        match listed.indexes.iter().find(|i| i.name == self.index) {
            Some(existing) => {
                if let Some(found) = existing.dimension.filter(|d| *d != dimensions) {
                    return Err(Error::config(format!(
                        "Pinecone index {} has dimension {}, embeddings have {}",
                        self.index, found, dimensions
                    )));
                }
            }
            None => {
                tracing::info!(
                    "Creating Pinecone index {} ({} dims, cosine, {}/{})",
                    self.index,
                    dimensions,
                    self.cloud,
                    self.region
                );
                let request = CreateIndexRequest::serverless(&self.index, dimensions, &self.cloud, &self.region);
                let response = self
                    .authed(self.client.post(&url))
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::upstream(Stage::Upsert, format!("Pinecone create_index failed: {}", e)))?;
                read_json::<IndexDescription>(response, Stage::Upsert, "Pinecone create_index").await?;
            }
        }

        for _ in 0..INDEX_READY_POLLS {
            let described = self.describe(Stage::Upsert).await?;
            if described.status.ready {
                tracing::info!("Pinecone index {} ready at {}", self.index, described.host);
                // Another caller may have resolved it meanwhile; same value
                let _ = self.host.set(normalize_host(&described.host));
                return Ok(());
            }
            tokio::time::sleep(INDEX_READY_INTERVAL).await;
        }

        Err(Error::upstream(
            Stage::Upsert,
            format!(
                "Pinecone index {} not ready after {}s",
                self.index,
                INDEX_READY_POLLS as u64 * INDEX_READY_INTERVAL.as_secs()
            ),
        ))
    }
}

#[derive(serde::Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexSummary>,
}

#[derive(serde::Deserialize)]
struct IndexSummary {
    name: String,
    #[serde(default)]
    dimension: Option<usize>,
}

#[derive(serde::Deserialize)]
struct IndexDescription {
    #[serde(default)]
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Default, serde::Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(serde::Serialize)]
struct CreateIndexRequest<'a> {
    name: &'a str,
    dimension: usize,
    metric: &'static str,
    spec: IndexSpec<'a>,
}

#[derive(serde::Serialize)]
struct IndexSpec<'a> {
    serverless: ServerlessSpec<'a>,
}

#[derive(serde::Serialize)]
struct ServerlessSpec<'a> {
    cloud: &'a str,
    region: &'a str,
}

impl<'a> CreateIndexRequest<'a> {
    fn serverless(name: &'a str, dimension: usize, cloud: &'a str, region: &'a str) -> Self {
        Self {
            name,
            dimension,
            metric: "cosine",
            spec: IndexSpec {
                serverless: ServerlessSpec { cloud, region },
            },
        }
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Value>,
}

#[derive(serde::Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<ScoredVector>,
}

#[derive(serde::Deserialize)]
struct ScoredVector {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

impl From<ScoredVector> for Match {
    fn from(v: ScoredVector) -> Self {
        Match {
            id: v.id,
            score: v.score,
            metadata: MatchMetadata::from_json(v.metadata.unwrap_or_default()),
        }
    }
}

#[derive(serde::Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [ChunkRecord],
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[async_trait]
impl VectorStoreProvider for PineconeIndex {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&SourceFilter>,
        include_metadata: bool,
    ) -> Result<Vec<Match>> {
        let url = format!("{}/query", self.host(Stage::Retrieve).await?);
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata,
            include_values: false,
            filter: filter.map(SourceFilter::to_metadata_filter),
        };

        let response = self
            .authed(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream(Stage::Retrieve, format!("Pinecone query failed: {}", e)))?;

        let query_response: QueryResponse = read_json(response, Stage::Retrieve, "Pinecone query").await?;
        Ok(query_response.matches.into_iter().map(Match::from).collect())
    }

    async fn ensure_ready(&self, dimensions: usize) -> Result<()> {
        self.ensure_index(dimensions).await
    }

    async fn upsert(&self, records: &[ChunkRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let url = format!("{}/vectors/upsert", self.host(Stage::Upsert).await?);
        let mut written = 0;

        for batch in records.chunks(UPSERT_BATCH) {
            let response = self
                .authed(self.client.post(&url))
                .json(&UpsertRequest { vectors: batch })
                .send()
                .await
                .map_err(|e| Error::upstream(Stage::Upsert, format!("Pinecone upsert failed: {}", e)))?;

            let upserted: UpsertResponse = read_json(response, Stage::Upsert, "Pinecone upsert").await?;
            written += upserted.upserted_count;
        }

        Ok(written)
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
