//! PDF RAG server binary
//!
//! Run with: cargo run -p pdf-rag --bin pdf-rag-server -- [config.toml]

use std::path::PathBuf;

use pdf_rag::{
    build_providers,
    config::{LlmBackend, RagConfig},
    providers::OllamaClient,
    server::{state::AppState, RagServer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = pdf_rag::config::load_dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdf_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(path) = &dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = RagConfig::load(config_path.as_deref())?;
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {} ({} dims)", config.embeddings.model, config.embeddings.dimensions);
    tracing::info!("  - LLM: {:?} / {}", config.llm.backend, config.llm.model);
    tracing::info!("  - Vector index: {}", config.vector_db.index);
    tracing::info!("  - Chunking: {} chars, {} overlap", config.chunking.max_chars, config.chunking.overlap);

    let ollama = OllamaClient::new(config.embeddings.base_url.clone(), config.timeouts.request_timeout())?;
    if ollama.health_check().await {
        tracing::info!("Ollama is running at {}", config.embeddings.base_url);
    } else {
        tracing::warn!("Ollama not available at {}", config.embeddings.base_url);
        tracing::warn!("  Start it with `ollama serve` and pull the model: ollama pull {}", config.embeddings.model);
        if config.llm.backend == LlmBackend::Ollama {
            tracing::warn!("  The LLM backend is also Ollama: ollama pull {}", config.llm.model);
        }
    }

    let providers = build_providers(&config)?;
    let state = AppState::with_providers(&config, &providers)?;
    let server = RagServer::new(config.server.clone(), state);

    println!("\nServer starting...");
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/ask         - Ask a question");
    println!("  POST /api/upload_pdf  - Upload and ingest a PDF");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
