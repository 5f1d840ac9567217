//! Document ingestion: PDF page extraction, chunking, and vector upsert
//!
//! Every chunk is tagged with the document's [`SourceId`](crate::types::SourceId),
//! the same identifier the query side filters on.

mod chunker;
mod parser;
mod processor;

pub use chunker::{PageChunk, TextChunker};
pub use parser::{PageText, ParsedPdf, PdfParser};
pub use processor::IngestPipeline;
