//! Core types for the question-answering pipeline

pub mod document;
pub mod matches;
pub mod query;
pub mod response;

pub use document::{ChunkMetadata, ChunkRecord, PageRef, SourceId};
pub use matches::{Match, MatchMetadata, MatchSet, MatchSummary};
pub use query::Query;
pub use response::{DistilledContext, IngestReport, QueryAnswer};
