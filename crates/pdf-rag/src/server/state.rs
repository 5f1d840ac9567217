//! Shared application state for the HTTP server

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::ingestion::IngestPipeline;
use crate::pipeline::QueryPipeline;
use crate::providers::{build_providers, Providers};

/// Shared application state, cheap to clone into handlers
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    query: QueryPipeline,
    ingest: IngestPipeline,
    upload_dir: PathBuf,
}

impl AppState {
    /// Build providers and pipelines from configuration
    pub fn new(config: &RagConfig) -> Result<Self> {
        let providers = build_providers(config)?;
        Self::with_providers(config, &providers)
    }

    /// Build pipelines around already-constructed providers
    pub fn with_providers(config: &RagConfig, providers: &Providers) -> Result<Self> {
        Ok(Self::from_parts(
            QueryPipeline::from_providers(config, providers),
            IngestPipeline::from_providers(config, providers)?,
            config.server.upload_dir.clone(),
        ))
    }

    pub fn from_parts(query: QueryPipeline, ingest: IngestPipeline, upload_dir: PathBuf) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                query,
                ingest,
                upload_dir,
            }),
        }
    }

    pub fn query(&self) -> &QueryPipeline {
        &self.inner.query
    }

    pub fn ingest(&self) -> &IngestPipeline {
        &self.inner.ingest
    }

    /// Directory uploaded PDFs are saved to before ingestion
    pub fn upload_dir(&self) -> &Path {
        &self.inner.upload_dir
    }
}
