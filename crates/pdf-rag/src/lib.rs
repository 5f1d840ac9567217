//! pdf-rag: question answering over an ingested PDF
//!
//! A question is embedded and matched against chunk vectors of one document
//! in a vector store. The retrieved chunks are distilled by an LLM into the
//! context relevant to the question, and a second LLM call synthesizes the
//! final answer from that context.
//!
//! ```text
//! question ─▶ Retriever ─▶ ContextDistiller ─▶ AnswerSynthesizer ─▶ answer
//!               │  (embed + filtered similarity search)
//!               ▼
//!           retrieved chunks (returned alongside the answer)
//! ```
//!
//! Documents are written to the store by [`ingestion::IngestPipeline`], tagged
//! with the same [`SourceId`] the query side filters on.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::RagConfig;
pub use error::{Error, Result, Stage};
pub use ingestion::IngestPipeline;
pub use pipeline::{PipelineSettings, QueryPipeline};
pub use providers::{build_providers, Providers};
pub use retrieval::{build_filter, SourceFilter};
pub use types::{IngestReport, Match, MatchSet, Query, QueryAnswer, SourceId};
