//! Provider abstractions for embeddings, LLM, and vector storage
//!
//! The pipeline only sees the traits; the concrete backend is picked from
//! configuration in [`build_providers`].

pub mod embedding;
pub mod gemini;
pub(crate) mod http;
pub mod llm;
pub mod memory;
pub mod ollama;
pub mod pinecone;
pub mod vector_store;

use std::sync::Arc;

pub use embedding::EmbeddingProvider;
pub use gemini::GeminiClient;
pub use llm::LlmProvider;
pub use memory::MemoryVectorStore;
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};
pub use pinecone::PineconeIndex;
pub use vector_store::VectorStoreProvider;

use crate::config::{LlmBackend, RagConfig, VectorBackend};
use crate::error::Result;

/// Constructed provider handles, shared by the query pipeline and ingestion
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub vector_store: Arc<dyn VectorStoreProvider>,
    pub llm: Arc<dyn LlmProvider>,
}

/// Build providers for the configured backends. No network calls are made.
pub fn build_providers(config: &RagConfig) -> Result<Providers> {
    let timeout = config.timeouts.request_timeout();

    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(OllamaEmbedder::new(&config.embeddings, timeout)?);

    let vector_store: Arc<dyn VectorStoreProvider> = match config.vector_db.backend {
        VectorBackend::Pinecone => Arc::new(PineconeIndex::new(&config.vector_db, timeout)?),
        VectorBackend::Memory => {
            tracing::warn!("Using in-memory vector store; ingested chunks are not persisted");
            Arc::new(MemoryVectorStore::new())
        }
    };

    let llm: Arc<dyn LlmProvider> = match config.llm.backend {
        LlmBackend::Gemini => Arc::new(GeminiClient::new(&config.llm, timeout)?),
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(&config.llm, timeout)?),
    };

    tracing::info!(
        "Providers: embeddings={} ({}), vector store={} (index {}), llm={} ({})",
        embedder.name(),
        config.embeddings.model,
        vector_store.name(),
        config.vector_db.index,
        llm.name(),
        llm.model()
    );

    Ok(Providers {
        embedder,
        vector_store,
        llm,
    })
}
