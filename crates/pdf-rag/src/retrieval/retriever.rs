//! Similarity retrieval: embed the query, search the vector store

use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result, Stage};
use crate::pipeline::bounded;
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::{MatchSet, Query};

use super::SourceFilter;

/// Issues one embedding call and one similarity search per query
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    timeout: Option<Duration>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStoreProvider>) -> Self {
        Self {
            embedder,
            store,
            timeout: None,
        }
    }

    /// Bound each of the two external calls
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Return up to `top_k` matches for `query`, best first.
    ///
    /// An empty set is returned as such, not as an error.
    pub async fn retrieve(
        &self,
        query: &Query,
        filter: Option<&SourceFilter>,
        top_k: usize,
    ) -> Result<MatchSet> {
        if top_k == 0 {
            return Err(Error::invalid_input("top_k must be a positive integer"));
        }

        let vector = bounded(Stage::Embed, self.timeout, self.embedder.embed(query.as_str()))
            .await
            .map_err(|e| e.at_stage(Stage::Embed))?;

        tracing::debug!(
            "Searching {} (top_k={}, filter={:?})",
            self.store.name(),
            top_k,
            filter.map(SourceFilter::value)
        );

        let matches = bounded(
            Stage::Retrieve,
            self.timeout,
            self.store.query(&vector, top_k, filter, true),
        )
        .await
        .map_err(|e| e.at_stage(Stage::Retrieve))?;

        let set = MatchSet::from_ranked(matches, top_k);
        tracing::info!("Retrieved {} matches", set.len());
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{call_log, sample_match, FakeEmbedder, FakeStore};

    #[tokio::test]
    async fn test_retrieve_passes_filter_and_top_k() {
        let log = call_log();
        let store = Arc::new(FakeStore::new(
            &log,
            vec![sample_match("a", 0.9, "T1"), sample_match("b", 0.8, "T2")],
        ));
        let retriever = Retriever::new(Arc::new(FakeEmbedder::new(&log)), store.clone());

        let filter = SourceFilter::new("local://policy.pdf");
        let query = Query::new("refunds?").unwrap();
        let set = retriever.retrieve(&query, Some(&filter), 5).await.unwrap();

        assert_eq!(set.texts(), ["T1", "T2"]);
        assert_eq!(*store.last_filter.lock(), Some(filter));
        assert_eq!(*store.last_top_k.lock(), Some(5));
        assert_eq!(*log.lock(), ["embed:refunds?", "query"]);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let log = call_log();
        let retriever = Retriever::new(
            Arc::new(FakeEmbedder::new(&log)),
            Arc::new(FakeStore::new(&log, Vec::new())),
        );

        let set = retriever
            .retrieve(&Query::new("anything").unwrap(), None, 5)
            .await
            .unwrap();
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn test_embed_failure_skips_search() {
        let log = call_log();
        let mut embedder = FakeEmbedder::new(&log);
        embedder.fail = true;
        let retriever = Retriever::new(Arc::new(embedder), Arc::new(FakeStore::new(&log, Vec::new())));

        let err = retriever
            .retrieve(&Query::new("anything").unwrap(), None, 5)
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Embed));
        assert_eq!(*log.lock(), ["embed:anything"]);
    }

    #[tokio::test]
    async fn test_zero_top_k_rejected() {
        let log = call_log();
        let retriever = Retriever::new(
            Arc::new(FakeEmbedder::new(&log)),
            Arc::new(FakeStore::new(&log, Vec::new())),
        );

        let err = retriever
            .retrieve(&Query::new("anything").unwrap(), None, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(log.lock().is_empty());
    }
}
