//! Query pipeline: filter → retrieve → distill → synthesize
//!
//! Each invocation is stateless. The four external calls run strictly in
//! sequence since each consumes the previous one's output.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RagConfig;
use crate::error::{Error, Result, Stage};
use crate::generation::{AnswerSynthesizer, ContextDistiller};
use crate::providers::{EmbeddingProvider, LlmProvider, Providers, VectorStoreProvider};
use crate::retrieval::{build_filter, Retriever, SourceFilter};
use crate::types::{MatchSet, Query, QueryAnswer};

/// Await `fut`, failing with an upstream error for `stage` once `timeout` elapses
pub(crate) async fn bounded<T, F>(stage: Stage, timeout: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
            Error::upstream(stage, format!("timed out after {}s", limit.as_secs_f32()))
        })?,
        None => fut.await,
    }
}

/// Pipeline settings fixed at construction
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Neighbours requested per query
    pub top_k: usize,
    /// Document restriction, built once from configuration
    pub filter: Option<SourceFilter>,
    /// Bound on each external call
    pub request_timeout: Option<Duration>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            filter: None,
            request_timeout: None,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            filter: build_filter(&config.document),
            request_timeout: Some(config.timeouts.request_timeout()),
        }
    }
}

/// Answers questions over the ingested document
pub struct QueryPipeline {
    settings: PipelineSettings,
    retriever: Retriever,
    distiller: ContextDistiller,
    synthesizer: AnswerSynthesizer,
}

impl QueryPipeline {
    /// Assemble a pipeline from already-constructed providers
    pub fn new(
        settings: PipelineSettings,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let mut retriever = Retriever::new(embedder, store);
        let mut distiller = ContextDistiller::new(Arc::clone(&llm));
        let mut synthesizer = AnswerSynthesizer::new(llm);

        if let Some(timeout) = settings.request_timeout {
            retriever = retriever.with_timeout(timeout);
            distiller = distiller.with_timeout(timeout);
            synthesizer = synthesizer.with_timeout(timeout);
        }

        if let Some(filter) = &settings.filter {
            tracing::info!("Restricting retrieval to source {}", filter.value());
        } else {
            tracing::info!("No document configured, searching all sources");
        }

        Self {
            settings,
            retriever,
            distiller,
            synthesizer,
        }
    }

    /// Build from configuration and provider handles
    pub fn from_providers(config: &RagConfig, providers: &Providers) -> Self {
        Self::new(
            PipelineSettings::from_config(config),
            Arc::clone(&providers.embedder),
            Arc::clone(&providers.vector_store),
            Arc::clone(&providers.llm),
        )
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Retrieval only, for inspection
    pub async fn search(&self, question: &str) -> Result<MatchSet> {
        let query = Query::new(question)?;
        self.retriever
            .retrieve(&query, self.settings.filter.as_ref(), self.settings.top_k)
            .await
    }

    /// Answer `question` and return the raw retrieved chunk texts with it.
    ///
    /// Zero matches yields [`QueryAnswer::no_matches`] without any LLM call.
    pub async fn answer_question(&self, question: &str) -> Result<QueryAnswer> {
        let start = Instant::now();
        let query = Query::new(question)?;

        tracing::info!("Query: \"{}\"", query);

        let matches = self
            .retriever
            .retrieve(&query, self.settings.filter.as_ref(), self.settings.top_k)
            .await?;

        if matches.is_empty() {
            tracing::info!("No matches, skipping distillation and synthesis");
            return Ok(QueryAnswer::no_matches());
        }

        let retrieved_chunks = matches.texts();
        let context = self.distiller.distill(&query, &matches).await?;
        let answer = self.synthesizer.synthesize(&query, &context).await?;

        tracing::info!(
            "Query completed in {}ms, {} chunks retrieved",
            start.elapsed().as_millis(),
            retrieved_chunks.len()
        );

        Ok(QueryAnswer::new(answer, retrieved_chunks))
    }
}
