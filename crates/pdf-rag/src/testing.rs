//! Recording test doubles for the provider traits

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Map;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result, Stage};
use crate::providers::{EmbeddingProvider, LlmProvider, VectorStoreProvider};
use crate::retrieval::SourceFilter;
use crate::types::{ChunkRecord, Match, MatchMetadata, PageRef};

/// Ordered log of external calls shared by the doubles
pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Serve `router` on an ephemeral local port, returning its base URL
pub(crate) async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", address)
}

pub(crate) fn sample_match(id: &str, score: f32, text: &str) -> Match {
    Match {
        id: id.to_string(),
        score,
        metadata: MatchMetadata {
            text: text.to_string(),
            page: PageRef::Number(1),
            source: "local://policy.pdf".to_string(),
            extra: Map::new(),
        },
    }
}

pub(crate) struct FakeEmbedder {
    pub log: CallLog,
    pub dimensions: usize,
    pub fail: bool,
}

impl FakeEmbedder {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
            dimensions: 4,
            fail: false,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.log.lock().push(format!("embed:{}", text));
        if self.fail {
            return Err(Error::upstream(Stage::Embed, "embedding service unreachable"));
        }
        // Deterministic vector derived from the text length
        let seed = text.len() as f32;
        Ok((0..self.dimensions).map(|i| seed + i as f32).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "fake"
    }
}

pub(crate) struct FakeStore {
    pub log: CallLog,
    pub matches: Vec<Match>,
    pub fail: bool,
    pub last_filter: Mutex<Option<SourceFilter>>,
    pub last_top_k: Mutex<Option<usize>>,
    pub upserted: Mutex<Vec<ChunkRecord>>,
}

impl FakeStore {
    pub fn new(log: &CallLog, matches: Vec<Match>) -> Self {
        Self {
            log: Arc::clone(log),
            matches,
            fail: false,
            last_filter: Mutex::new(None),
            last_top_k: Mutex::new(None),
            upserted: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(log: &CallLog) -> Self {
        Self {
            fail: true,
            ..Self::new(log, Vec::new())
        }
    }
}

#[async_trait]
impl VectorStoreProvider for FakeStore {
    async fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        filter: Option<&SourceFilter>,
        _include_metadata: bool,
    ) -> Result<Vec<Match>> {
        self.log.lock().push("query".to_string());
        *self.last_filter.lock() = filter.cloned();
        *self.last_top_k.lock() = Some(top_k);
        if self.fail {
            return Err(Error::upstream(Stage::Retrieve, "vector store returned 503"));
        }
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    async fn ensure_ready(&self, dimensions: usize) -> Result<()> {
        self.log.lock().push(format!("ensure_ready:{}", dimensions));
        Ok(())
    }

    async fn upsert(&self, records: &[ChunkRecord]) -> Result<usize> {
        self.log.lock().push(format!("upsert:{}", records.len()));
        if self.fail {
            return Err(Error::upstream(Stage::Upsert, "vector store returned 503"));
        }
        self.upserted.lock().extend_from_slice(records);
        Ok(records.len())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// LLM double answering calls from a script, in order
pub(crate) struct FakeLlm {
    pub log: CallLog,
    pub responses: Vec<String>,
    pub prompts: Mutex<Vec<String>>,
    /// Zero-based call index that fails
    pub fail_on: Option<usize>,
    pub delay: Option<Duration>,
}

impl FakeLlm {
    pub fn new(log: &CallLog, responses: &[&str]) -> Self {
        Self {
            log: Arc::clone(log),
            responses: responses.iter().map(|r| r.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
            fail_on: None,
            delay: None,
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub fn prompt(&self, index: usize) -> String {
        self.prompts.lock()[index].clone()
    }
}

#[async_trait]
impl LlmProvider for FakeLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let index = {
            let mut prompts = self.prompts.lock();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        self.log.lock().push(format!("generate:{}", index));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on == Some(index) {
            return Err(Error::upstream(Stage::Generate, "model overloaded"));
        }
        self.responses
            .get(index)
            .cloned()
            .ok_or_else(|| Error::internal(format!("unscripted LLM call {}", index)))
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}
