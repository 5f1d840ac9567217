//! Pipeline outputs

use serde::{Deserialize, Serialize};

use super::document::SourceId;

/// Answer returned when retrieval finds nothing
pub const NO_MATCHES_ANSWER: &str = "No matches found in the vector store.";

/// Relevance-focused text distilled from retrieved chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistilledContext(String);

impl DistilledContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Final answer plus the raw retrieved chunk texts, in rank order.
///
/// `retrieved_chunks` always reflects what retrieval returned, never the
/// distilled context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub retrieved_chunks: Vec<String>,
}

impl QueryAnswer {
    pub fn new(answer: impl Into<String>, retrieved_chunks: Vec<String>) -> Self {
        Self {
            answer: answer.into(),
            retrieved_chunks,
        }
    }

    /// Sentinel for an empty retrieval
    pub fn no_matches() -> Self {
        Self::new(NO_MATCHES_ANSWER, Vec::new())
    }

    pub fn is_no_matches(&self) -> bool {
        self.retrieved_chunks.is_empty() && self.answer == NO_MATCHES_ANSWER
    }
}

/// Result of ingesting one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Pages with extractable text
    pub pages: usize,
    /// Chunks upserted
    pub chunks: usize,
    /// Identifier to filter queries by
    pub file_id: SourceId,
}
