//! HTTP server for the PDF RAG service

pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use state::AppState;

/// PDF RAG HTTP server
pub struct RagServer {
    config: ServerConfig,
    state: AppState,
}

impl RagServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        build_router(&self.config, self.state.clone())
    }

    /// Bind and serve until the process exits
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::config(format!("Invalid address: {}", e)))?;

        let router = self.router();

        tracing::info!("Starting PDF RAG server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::config(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }
}

pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", routes::api_routes(config.max_upload_size))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if config.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::{IngestPipeline, TextChunker};
    use crate::pipeline::{PipelineSettings, QueryPipeline};
    use crate::testing::{call_log, sample_match, CallLog, FakeEmbedder, FakeLlm, FakeStore};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(log: &CallLog, store: FakeStore, llm: FakeLlm, upload_dir: &std::path::Path) -> Router {
        let store = Arc::new(store);
        let embedder = Arc::new(FakeEmbedder::new(log));
        let query = QueryPipeline::new(
            PipelineSettings::default(),
            embedder.clone(),
            store.clone(),
            Arc::new(llm),
        );
        let ingest = IngestPipeline::new(TextChunker::default(), embedder, store).unwrap();
        let state = AppState::from_parts(query, ingest, upload_dir.to_path_buf());
        build_router(&ServerConfig::default(), state)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn ask_request(body: &str) -> Request<Body> {
        Request::post("/api/ask")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let log = call_log();
        let app = app(&log, FakeStore::new(&log, Vec::new()), FakeLlm::new(&log, &[]), dir.path());

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ask_returns_answer_and_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let log = call_log();
        let store = FakeStore::new(
            &log,
            vec![sample_match("1", 0.91, "T1"), sample_match("2", 0.85, "T2")],
        );
        let llm = FakeLlm::new(&log, &["DISTILLED", "Refunds take 30 days."]);
        let app = app(&log, store, llm, dir.path());

        let response = app
            .oneshot(ask_request(r#"{"query": "What is the refund policy?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["query"], "What is the refund policy?");
        assert_eq!(body["answer"], "Refunds take 30 days.");
        assert_eq!(body["retrieved_chunks"], serde_json::json!(["T1", "T2"]));
    }

    #[tokio::test]
    async fn test_ask_without_query_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let log = call_log();
        let app = app(&log, FakeStore::new(&log, Vec::new()), FakeLlm::new(&log, &[]), dir.path());

        let response = app.oneshot(ask_request("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["error"]["type"], "invalid_input");
        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_ask_malformed_body_uses_error_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let log = call_log();
        let app = app(&log, FakeStore::new(&log, Vec::new()), FakeLlm::new(&log, &[]), dir.path());

        let response = app.clone().oneshot(ask_request("{\"query\": ")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["type"], "invalid_input");

        let untyped = Request::post("/api/ask")
            .body(Body::from(r#"{"query": "refunds?"}"#))
            .unwrap();
        let response = app.oneshot(untyped).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["type"], "invalid_input");
        assert!(body["error"]["message"].as_str().unwrap().contains("Content-Type"));

        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_ask_store_failure_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let log = call_log();
        let app = app(&log, FakeStore::failing(&log), FakeLlm::new(&log, &[]), dir.path());

        let response = app.oneshot(ask_request(r#"{"query": "refunds?"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = json_body(response).await;
        assert_eq!(body["error"]["stage"], "retrieve");
    }

    #[tokio::test]
    async fn test_upload_without_file_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let log = call_log();
        let app = app(&log, FakeStore::new(&log, Vec::new()), FakeLlm::new(&log, &[]), dir.path());

        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::post("/api/upload_pdf")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "No file provided");
    }

    #[tokio::test]
    async fn test_upload_non_pdf_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let log = call_log();
        let app = app(&log, FakeStore::new(&log, Vec::new()), FakeLlm::new(&log, &[]), dir.path());

        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"my notes.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\nnot really a pdf\r\n--{b}--\r\n",
            b = boundary
        );
        let request = Request::post("/api/upload_pdf")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        // saved under its sanitized name before ingestion
        assert!(dir.path().join("my_notes.pdf").exists());
    }
}
