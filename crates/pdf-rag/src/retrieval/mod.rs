//! Source filtering and similarity retrieval

mod filter;
mod retriever;

pub use filter::{build_filter, SourceFilter};
pub use retriever::Retriever;
