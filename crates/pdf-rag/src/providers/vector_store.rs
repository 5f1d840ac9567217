//! Vector store provider trait for similarity search

use async_trait::async_trait;
use crate::error::Result;
use crate::retrieval::SourceFilter;
use crate::types::{ChunkRecord, Match};

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `PineconeIndex`: Pinecone serverless index
/// - `MemoryVectorStore`: In-process brute-force cosine store
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Return up to `top_k` nearest neighbours of `vector`, restricted to
    /// records matching `filter` when one is given.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&SourceFilter>,
        include_metadata: bool,
    ) -> Result<Vec<Match>>;

    /// Make sure the store can accept vectors of `dimensions` length,
    /// creating the index if the backend needs one. Called before ingestion.
    async fn ensure_ready(&self, _dimensions: usize) -> Result<()> {
        Ok(())
    }

    /// Insert or replace records, returning how many were written
    async fn upsert(&self, records: &[ChunkRecord]) -> Result<usize>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
