//! Ingestion pipeline: parse, chunk, embed, upsert

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;

use crate::config::RagConfig;
use crate::error::{Error, Result, Stage};
use crate::providers::http::build_client;
use crate::providers::{EmbeddingProvider, Providers, VectorStoreProvider};
use crate::types::{ChunkRecord, IngestReport, SourceId};

use super::chunker::{PageChunk, TextChunker};
use super::parser::{PageText, PdfParser};

/// Texts embedded per `embed_batch` call
const EMBED_BATCH: usize = 64;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Writes a document's chunks into the vector store under its [`SourceId`]
pub struct IngestPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    http: Client,
}

impl IngestPipeline {
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        Ok(Self {
            chunker,
            embedder,
            store,
            http: build_client(DOWNLOAD_TIMEOUT)?,
        })
    }

    pub fn from_providers(config: &RagConfig, providers: &Providers) -> Result<Self> {
        Self::new(
            TextChunker::new(config.chunking.max_chars, config.chunking.overlap),
            Arc::clone(&providers.embedder),
            Arc::clone(&providers.vector_store),
        )
    }

    /// Ingest a local PDF as `local://<basename>`
    pub async fn ingest_path(&self, path: &Path) -> Result<IngestReport> {
        let data = tokio::fs::read(path).await?;
        self.ingest_bytes(data, SourceId::local(path)).await
    }

    /// Download and ingest a PDF, identified by its URL
    pub async fn ingest_url(&self, url: &str) -> Result<IngestReport> {
        tracing::info!("Downloading {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::upstream(Stage::Download, format!("Download of {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::upstream(
                Stage::Download,
                format!("Download of {} failed ({})", url, status),
            ));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::upstream(Stage::Download, format!("Download of {} failed: {}", url, e)))?;

        self.ingest_bytes(data.to_vec(), SourceId::url(url)).await
    }

    /// Parse and ingest PDF bytes under `source`
    pub async fn ingest_bytes(&self, data: Vec<u8>, source: SourceId) -> Result<IngestReport> {
        let filename = source.to_string();
        let parsed = tokio::task::spawn_blocking(move || PdfParser::parse(&filename, &data))
            .await
            .map_err(|e| Error::file_parse(source.as_str(), format!("PDF extraction aborted: {}", e)))??;

        self.ingest_pages(&parsed.pages, source).await
    }

    /// Chunk, embed and upsert already-extracted pages
    pub(crate) async fn ingest_pages(&self, pages: &[PageText], source: SourceId) -> Result<IngestReport> {
        let start = Instant::now();
        let chunks = self.chunker.chunk_pages(pages);

        if chunks.is_empty() {
            return Err(Error::file_parse(source.as_str(), "No text chunks produced"));
        }

        self.store
            .ensure_ready(self.embedder.dimensions())
            .await
            .map_err(|e| e.at_stage(Stage::Upsert))?;

        let mut written = 0;
        for batch in chunks.chunks(EMBED_BATCH) {
            let records = self.embed_batch(batch, &source).await?;
            written += self
                .store
                .upsert(&records)
                .await
                .map_err(|e| e.at_stage(Stage::Upsert))?;
        }

        tracing::info!(
            "Ingested {} ({} pages, {} chunks, {} vectors written) in {}ms",
            source,
            pages.len(),
            chunks.len(),
            written,
            start.elapsed().as_millis()
        );

        Ok(IngestReport {
            pages: pages.len(),
            chunks: chunks.len(),
            file_id: source,
        })
    }

    async fn embed_batch(&self, batch: &[PageChunk], source: &SourceId) -> Result<Vec<ChunkRecord>> {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| e.at_stage(Stage::Embed))?;

        if vectors.len() != batch.len() {
            return Err(Error::upstream(
                Stage::Embed,
                format!("Expected {} embeddings, got {}", batch.len(), vectors.len()),
            ));
        }

        Ok(batch
            .iter()
            .zip(vectors)
            .map(|(chunk, values)| {
                ChunkRecord::new(source, chunk.page, chunk.chunk_id, chunk.text.clone(), values)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{call_log, FakeEmbedder, FakeStore};

    fn pages() -> Vec<PageText> {
        vec![
            PageText { number: 1, text: "Refunds are issued within 30 days.".to_string() },
            PageText { number: 2, text: "Shipping is free over $50.".to_string() },
        ]
    }

    #[tokio::test]
    async fn test_ingest_pages_writes_tagged_records() {
        let log = call_log();
        let store = Arc::new(FakeStore::new(&log, Vec::new()));
        let pipeline = IngestPipeline::new(
            TextChunker::default(),
            Arc::new(FakeEmbedder::new(&log)),
            store.clone(),
        )
        .unwrap();

        let source = SourceId::local("/data/policy.pdf");
        let report = pipeline.ingest_pages(&pages(), source.clone()).await.unwrap();

        assert_eq!(report.pages, 2);
        assert_eq!(report.chunks, 2);
        assert_eq!(report.file_id.as_str(), "local://policy.pdf");

        let upserted = store.upserted.lock();
        let ids: Vec<&str> = upserted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["local://policy.pdf::p1::0", "local://policy.pdf::p2::1"]);
        assert_eq!(upserted[1].metadata.page, 2);
        assert_eq!(upserted[1].metadata.source, source);
        assert_eq!(upserted[1].metadata.text, "Shipping is free over $50.");
        assert_eq!(upserted[0].values.len(), 4);
    }

    #[tokio::test]
    async fn test_store_prepared_before_first_embedding() {
        let log = call_log();
        let pipeline = IngestPipeline::new(
            TextChunker::default(),
            Arc::new(FakeEmbedder::new(&log)),
            Arc::new(FakeStore::new(&log, Vec::new())),
        )
        .unwrap();

        pipeline
            .ingest_pages(&pages(), SourceId::local("policy.pdf"))
            .await
            .unwrap();

        let log = log.lock();
        assert_eq!(log[0], "ensure_ready:4");
        assert!(log[1].starts_with("embed:"));
        assert_eq!(log.last().map(String::as_str), Some("upsert:2"));
    }

    #[tokio::test]
    async fn test_upserts_in_embedding_batches() {
        let log = call_log();
        let store = Arc::new(FakeStore::new(&log, Vec::new()));
        let pipeline = IngestPipeline::new(
            TextChunker::new(10, 0),
            Arc::new(FakeEmbedder::new(&log)),
            store.clone(),
        )
        .unwrap();

        // 70 ten-character chunks on one page
        let page = PageText { number: 1, text: "abcdefghij".repeat(70) };
        let report = pipeline
            .ingest_pages(&[page], SourceId::url("https://example.com/a.pdf"))
            .await
            .unwrap();

        assert_eq!(report.chunks, 70);
        let upserts: Vec<String> = log
            .lock()
            .iter()
            .filter(|entry| entry.starts_with("upsert"))
            .cloned()
            .collect();
        assert_eq!(upserts, ["upsert:64", "upsert:6"]);
    }

    #[tokio::test]
    async fn test_store_failure_is_upsert_error() {
        let log = call_log();
        let pipeline = IngestPipeline::new(
            TextChunker::default(),
            Arc::new(FakeEmbedder::new(&log)),
            Arc::new(FakeStore::failing(&log)),
        )
        .unwrap();

        let err = pipeline
            .ingest_pages(&pages(), SourceId::local("policy.pdf"))
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Upsert));
    }

    #[tokio::test]
    async fn test_invalid_pdf_bytes_rejected() {
        let log = call_log();
        let pipeline = IngestPipeline::new(
            TextChunker::default(),
            Arc::new(FakeEmbedder::new(&log)),
            Arc::new(FakeStore::new(&log, Vec::new())),
        )
        .unwrap();

        let err = pipeline
            .ingest_bytes(b"plain text".to_vec(), SourceId::local("notes.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let log = call_log();
        let pipeline = IngestPipeline::new(
            TextChunker::default(),
            Arc::new(FakeEmbedder::new(&log)),
            Arc::new(FakeStore::new(&log, Vec::new())),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = pipeline
            .ingest_path(&dir.path().join("missing.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
