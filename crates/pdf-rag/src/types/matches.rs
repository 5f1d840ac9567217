//! Retrieval results

use serde::Serialize;
use serde_json::{Map, Value};

use super::document::PageRef;

/// Metadata carried by a retrieved chunk
#[derive(Debug, Clone, PartialEq)]
pub struct MatchMetadata {
    /// Raw chunk content (empty if the record had none)
    pub text: String,
    /// Originating page
    pub page: PageRef,
    /// Document identifier
    pub source: String,
    /// Any other stored fields
    pub extra: Map<String, Value>,
}

impl MatchMetadata {
    /// Decode the metadata object returned by a vector store
    pub fn from_json(mut map: Map<String, Value>) -> Self {
        let text = take_string(&mut map, "text");
        let source = take_string(&mut map, "source");
        let page = PageRef::from_json(map.remove("page").as_ref());
        Self {
            text,
            page,
            source,
            extra: map,
        }
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> String {
    match map.remove(key) {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// A single retrieval result. Immutable once returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Opaque record id from the vector store
    pub id: String,
    /// Relevance score, higher is closer
    pub score: f32,
    pub metadata: MatchMetadata,
}

impl Match {
    pub fn text(&self) -> &str {
        &self.metadata.text
    }
}

/// Matches ordered by descending score, at most `top_k` long.
///
/// An empty set is a valid outcome meaning nothing indexed matched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSet {
    matches: Vec<Match>,
}

impl MatchSet {
    /// Build from store results. The sort is stable, so a store that already
    /// returns descending scores keeps its own tie order.
    pub fn from_ranked(mut matches: Vec<Match>, top_k: usize) -> Self {
        let sorted = matches
            .windows(2)
            .all(|w| w[0].score.total_cmp(&w[1].score).is_ge());
        if !sorted {
            tracing::warn!("Vector store returned matches out of score order, re-sorting");
            matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        }
        if matches.len() > top_k {
            tracing::warn!(
                "Vector store returned {} matches for top_k={}, truncating",
                matches.len(),
                top_k
            );
            matches.truncate(top_k);
        }
        Self { matches }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }

    /// Raw chunk texts in rank order
    pub fn texts(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.metadata.text.clone()).collect()
    }

    pub fn into_inner(self) -> Vec<Match> {
        self.matches
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

/// Match summary for JSON output (search endpoints, CLI)
#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub id: String,
    pub score: f32,
    pub page: Option<u32>,
    pub source: String,
    pub text: String,
}

impl From<&Match> for MatchSummary {
    fn from(m: &Match) -> Self {
        Self {
            id: m.id.clone(),
            score: m.score,
            page: match m.metadata.page {
                PageRef::Number(n) => Some(n),
                PageRef::Unknown => None,
            },
            source: m.metadata.source.clone(),
            text: m.metadata.text.clone(),
        }
    }
}
