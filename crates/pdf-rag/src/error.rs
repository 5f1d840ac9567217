//! Error types for the question-answering pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// External call that produced an upstream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Query or chunk embedding
    Embed,
    /// Similarity search against the vector store
    Retrieve,
    /// LLM call made by the context distiller
    Distill,
    /// LLM call made by the answer synthesizer
    Synthesize,
    /// LLM call not yet attributed to a pipeline stage
    Generate,
    /// Vector upsert during ingestion
    Upsert,
    /// Remote document download during ingestion
    Download,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Embed => "embed",
            Stage::Retrieve => "retrieve",
            Stage::Distill => "distill",
            Stage::Synthesize => "synthesize",
            Stage::Generate => "generate",
            Stage::Upsert => "upsert",
            Stage::Download => "download",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Empty or missing query text
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing credentials, index name, or otherwise unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external service failed, timed out, or returned a malformed response
    #[error("Upstream {stage} failed: {message}")]
    Upstream { stage: Stage, message: String },

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an upstream error for the given stage
    pub fn upstream(stage: Stage, message: impl Into<String>) -> Self {
        Self::Upstream {
            stage,
            message: message.into(),
        }
    }

    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Re-attribute an upstream failure to `stage`. Other kinds pass through.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            Error::Upstream { message, .. } => Error::Upstream { stage, message },
            other => other,
        }
    }

    /// Stage of an upstream failure, if this is one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Upstream { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg.clone()),
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", msg.clone()),
            Error::Upstream { stage, message } => (
                StatusCode::BAD_GATEWAY,
                "upstream_unavailable",
                format!("{} stage failed: {}", stage, message),
            ),
            Error::FileParse { filename, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "parse_error",
                format!("Failed to parse '{}': {}", filename, message),
            ),
            Error::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error", err.to_string()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let mut error = json!({
            "type": error_type,
            "message": message,
        });
        if let Some(stage) = self.stage() {
            error["stage"] = json!(stage.as_str());
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_stage_retags_upstream_only() {
        let err = Error::upstream(Stage::Generate, "boom").at_stage(Stage::Distill);
        assert_eq!(err.stage(), Some(Stage::Distill));
        assert_eq!(err.to_string(), "Upstream distill failed: boom");

        let err = Error::invalid_input("empty").at_stage(Stage::Distill);
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_status_codes() {
        let resp = Error::invalid_input("empty").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = Error::upstream(Stage::Retrieve, "down").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = Error::config("PINECONE_API_KEY missing").into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
