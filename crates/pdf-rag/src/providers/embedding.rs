//! Text embedding seam shared by retrieval and ingestion

use async_trait::async_trait;
use crate::error::Result;

/// Maps text to a fixed-length vector.
///
/// Queries and ingested chunks must go through the same model, otherwise
/// similarity scores are meaningless. Failures are `Error::Upstream` with
/// `Stage::Embed`.
///
/// Implementations:
/// - `OllamaEmbedder`: local Ollama server (all-minilm, 384 dims)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, output in input order.
    ///
    /// The default calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Vector length every call returns
    fn dimensions(&self) -> usize;

    /// Provider name for logging
    fn name(&self) -> &str;
}
