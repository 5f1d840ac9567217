//! In-process vector store
//!
//! Brute-force cosine search over records held in memory. Used for offline
//! runs and tests; contents are lost when the process exits.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::error::{Error, Result, Stage};
use crate::retrieval::SourceFilter;
use crate::types::{ChunkRecord, Match, MatchMetadata, PageRef};

use super::vector_store::VectorStoreProvider;

/// Local vector store
#[derive(Default)]
pub struct MemoryVectorStore {
    /// Records in insertion order
    records: RwLock<Vec<ChunkRecord>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

fn to_match(record: &ChunkRecord, score: f32, include_metadata: bool) -> Match {
    let metadata = if include_metadata {
        let mut extra = Map::new();
        extra.insert("chunk_id".to_string(), Value::from(record.metadata.chunk_id));
        MatchMetadata {
            text: record.metadata.text.clone(),
            page: PageRef::Number(record.metadata.page),
            source: record.metadata.source.to_string(),
            extra,
        }
    } else {
        MatchMetadata::from_json(Map::new())
    };

    Match {
        id: record.id.clone(),
        score,
        metadata,
    }
}

#[async_trait]
impl VectorStoreProvider for MemoryVectorStore {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&SourceFilter>,
        include_metadata: bool,
    ) -> Result<Vec<Match>> {
        let records = self.records.read();

        let mut scored: Vec<(f32, &ChunkRecord)> = Vec::new();
        for record in records.iter() {
            if filter.map_or(false, |f| !f.matches(record.metadata.source.as_str())) {
                continue;
            }
            if record.values.len() != vector.len() {
                return Err(Error::upstream(
                    Stage::Retrieve,
                    format!(
                        "Query has {} dimensions, record {} has {}",
                        vector.len(),
                        record.id,
                        record.values.len()
                    ),
                ));
            }
            scored.push((cosine_similarity(vector, &record.values), record));
        }

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(score, record)| to_match(record, score, include_metadata))
            .collect())
    }

    async fn upsert(&self, records: &[ChunkRecord]) -> Result<usize> {
        let mut stored = self.records.write();
        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
        }
        Ok(records.len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceId;

    fn record(source: &SourceId, chunk: usize, text: &str, values: Vec<f32>) -> ChunkRecord {
        ChunkRecord::new(source, 1, chunk, text.to_string(), values)
    }

    #[tokio::test]
    async fn test_query_ranks_by_cosine() {
        let store = MemoryVectorStore::new();
        let source = SourceId::local("/tmp/a.pdf");
        store
            .upsert(&[
                record(&source, 0, "far", vec![0.0, 1.0]),
                record(&source, 1, "near", vec![1.0, 0.1]),
                record(&source, 2, "exact", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let matches = store.query(&[1.0, 0.0], 2, None, true).await.unwrap();
        let texts: Vec<_> = matches.iter().map(|m| m.text()).collect();
        assert_eq!(texts, ["exact", "near"]);
        assert!(matches[0].score > matches[1].score);
    }

    #[tokio::test]
    async fn test_filter_restricts_to_source() {
        let store = MemoryVectorStore::new();
        let a = SourceId::local("/tmp/a.pdf");
        let b = SourceId::url("https://example.com/b.pdf");
        store
            .upsert(&[
                record(&a, 0, "from a", vec![1.0, 0.0]),
                record(&b, 0, "from b", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let filter = SourceFilter::new(b.as_str());
        let matches = store.query(&[1.0, 0.0], 5, Some(&filter), true).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text(), "from b");
        assert_eq!(matches[0].metadata.source, b.as_str());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_id() {
        let store = MemoryVectorStore::new();
        let source = SourceId::local("a.pdf");
        store.upsert(&[record(&source, 0, "old", vec![1.0])]).await.unwrap();
        store.upsert(&[record(&source, 0, "new", vec![1.0])]).await.unwrap();

        assert_eq!(store.len(), 1);
        let matches = store.query(&[1.0], 5, None, true).await.unwrap();
        assert_eq!(matches[0].text(), "new");
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_upstream_error() {
        let store = MemoryVectorStore::new();
        let source = SourceId::local("a.pdf");
        store.upsert(&[record(&source, 0, "x", vec![1.0, 0.0])]).await.unwrap();

        let err = store.query(&[1.0, 0.0, 0.0], 5, None, true).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Retrieve));
    }
}
