//! Document identity and indexed chunk records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identifier of an ingested document, stored as the `source` metadata field.
///
/// Local files are identified as `local://<basename>`; documents fetched from a
/// URL keep the URL verbatim. Ingestion and query filtering both go through
/// this type so the two sides agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Scheme prefix for locally ingested files
    pub const LOCAL_SCHEME: &'static str = "local://";

    /// Identifier for a local file: `local://<basename(path)>`
    pub fn local(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        Self(format!("{}{}", Self::LOCAL_SCHEME, name))
    }

    /// Identifier for a document fetched from `url`
    pub fn url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_local(&self) -> bool {
        self.0.starts_with(Self::LOCAL_SCHEME)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Page a chunk originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRef {
    Number(u32),
    Unknown,
}

impl PageRef {
    /// Decode a page from stored metadata. Vector stores commonly return
    /// integers as floats, so `3.0` decodes to page 3.
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        let number = match value {
            Some(serde_json::Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        number
            .and_then(|n| u32::try_from(n).ok())
            .map_or(PageRef::Unknown, PageRef::Number)
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRef::Number(n) => write!(f, "{}", n),
            PageRef::Unknown => f.write_str("?"),
        }
    }
}

/// Metadata written alongside each chunk vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Raw chunk text
    pub text: String,
    /// 1-based page number
    pub page: u32,
    /// Document identifier
    pub source: SourceId,
    /// Position of the chunk within the document
    pub chunk_id: usize,
}

/// A chunk vector ready for upsert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: ChunkMetadata,
}

impl ChunkRecord {
    /// Build a record with the id `{source}::p{page}::{chunk_id}`
    pub fn new(source: &SourceId, page: u32, chunk_id: usize, text: String, values: Vec<f32>) -> Self {
        Self {
            id: format!("{}::p{}::{}", source, page, chunk_id),
            values,
            metadata: ChunkMetadata {
                text,
                page,
                source: source.clone(),
                chunk_id,
            },
        }
    }
}
