//! Configuration for the question-answering service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// LLM configuration
    pub llm: LlmConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Document the queries are restricted to
    pub document: DocumentConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Chunking configuration (ingestion)
    pub chunking: ChunkingConfig,
    /// Timeouts for external calls
    pub timeouts: TimeoutConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
    /// Directory uploaded PDFs are saved to
    pub upload_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
            upload_dir: PathBuf::from("uploads"),
        }
    }
}

/// Embedding configuration
///
/// The model must be the one the index was populated with; no compatibility
/// check is made beyond the vector length.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model (default: all-minilm, the Ollama build of all-MiniLM-L6-v2)
    pub model: String,
    /// Embedding dimensions (384 for MiniLM)
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
        }
    }
}

/// LLM backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Google Gemini via the Generative Language API
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend provider
    pub backend: LlmBackend,
    /// API key (required for Gemini)
    pub api_key: Option<String>,
    /// Generation model name
    pub model: String,
    /// API base URL. Defaults per backend when unset.
    pub base_url: Option<String>,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum output tokens per call
    pub max_output_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Gemini,
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            base_url: None,
            temperature: 0.2,
            max_output_tokens: 2048,
        }
    }
}

impl LlmConfig {
    /// Base URL for the configured backend
    pub fn resolved_base_url(&self) -> &str {
        match (&self.base_url, &self.backend) {
            (Some(url), _) => url,
            (None, LlmBackend::Gemini) => "https://generativelanguage.googleapis.com/v1beta",
            (None, LlmBackend::Ollama) => "http://localhost:11434",
        }
    }
}

/// Vector store backend selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// Pinecone serverless index
    #[default]
    Pinecone,
    /// In-process store, lost on exit
    Memory,
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    /// Backend provider
    pub backend: VectorBackend,
    /// API key (required for Pinecone)
    pub api_key: Option<String>,
    /// Index name
    pub index: String,
    /// Pinecone control plane URL, used to resolve the index host
    pub control_plane_url: String,
    /// Data plane host override (skips host resolution and index creation)
    pub host: Option<String>,
    /// Serverless cloud used when the index has to be created
    pub cloud: String,
    /// Serverless region used when the index has to be created
    pub region: String,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Pinecone,
            api_key: None,
            index: "pdf-chunks-index".to_string(),
            control_plane_url: "https://api.pinecone.io".to_string(),
            host: None,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
        }
    }
}

/// Identifies the ingested document queries are restricted to.
/// When both are set the URL wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Original URL the document was ingested from
    pub url: Option<String>,
    /// Local path the document was ingested from
    pub path: Option<PathBuf>,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of nearest neighbours requested per query
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters (smaller = better semantic coherence)
    pub max_chars: usize,
    /// Overlap between chunks in characters
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 800,
            overlap: 200,
        }
    }
}

/// Timeouts for external calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on each embedding, search, and generation call
    pub request_timeout_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
        }
    }
}

impl TimeoutConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Load `.env` from the working directory or a parent into the process
/// environment. Variables already set keep their values.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment
    /// overrides from the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse TOML configuration text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Invalid config: {}", e)))
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("PINECONE_API_KEY") {
            self.vector_db.api_key = Some(key);
        }
        if let Some(index) = get("PINECONE_INDEX") {
            self.vector_db.index = index;
        }
        if let Some(host) = get("PINECONE_HOST") {
            self.vector_db.host = Some(host);
        }
        if let Some(cloud) = get("PINECONE_CLOUD") {
            self.vector_db.cloud = cloud;
        }
        if let Some(region) = get("PINECONE_REGION") {
            self.vector_db.region = region;
        }
        if let Some(key) = get("GEMINI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get("GEMINI_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = get("PDF_URL") {
            self.document.url = Some(url);
        }
        if let Some(path) = get("PDF_PATH") {
            self.document.path = Some(PathBuf::from(path));
        }
        if let Some(url) = get("OLLAMA_BASE_URL") {
            self.embeddings.base_url = url;
        }
        if let Some(model) = get("EMBED_MODEL") {
            self.embeddings.model = model;
        }
        if let Some(top_k) = get("TOP_K") {
            self.retrieval.top_k = parse_number("TOP_K", &top_k)?;
        }
        if let Some(max_chars) = get("CHUNK_MAX_CHARS") {
            self.chunking.max_chars = parse_number("CHUNK_MAX_CHARS", &max_chars)?;
        }
        if let Some(overlap) = get("CHUNK_OVERLAP") {
            self.chunking.overlap = parse_number("CHUNK_OVERLAP", &overlap)?;
        }

        Ok(())
    }

    /// Check required settings. Run once at startup, before any network call.
    pub fn validate(&self) -> Result<()> {
        if self.vector_db.backend == VectorBackend::Pinecone {
            if is_blank(&self.vector_db.api_key) {
                return Err(Error::config("PINECONE_API_KEY missing; set it in the environment or .env"));
            }
            if self.vector_db.index.trim().is_empty() {
                return Err(Error::config("Pinecone index name missing"));
            }
        }

        if self.llm.backend == LlmBackend::Gemini && is_blank(&self.llm.api_key) {
            return Err(Error::config("GEMINI_API_KEY missing; set it in the environment or .env"));
        }

        if self.retrieval.top_k == 0 {
            return Err(Error::config("top_k must be a positive integer"));
        }

        if self.embeddings.dimensions == 0 {
            return Err(Error::config("Embedding dimensions must be positive"));
        }

        if self.chunking.overlap >= self.chunking.max_chars {
            return Err(Error::config(format!(
                "Chunk overlap ({}) must be smaller than max_chars ({})",
                self.chunking.overlap, self.chunking.max_chars
            )));
        }

        Ok(())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

fn parse_number(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{} must be a non-negative integer, got '{}'", key, value)))
}
