//! PDF upload and ingestion endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::server::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    /// Source identifier to configure as the query document
    pub file_id: String,
    pub pages: usize,
    pub chunks: usize,
}

/// POST /api/upload_pdf - Save an uploaded PDF and ingest it
pub async fn upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_input(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::invalid_input(format!("Failed to read file: {}", e)))?;
        upload = Some((original, data));
        break;
    }

    let (original, data) = upload.ok_or_else(|| Error::invalid_input("No file provided"))?;
    if original.trim().is_empty() {
        return Err(Error::invalid_input("No file selected"));
    }

    let filename = secure_filename(&original)?;
    tracing::info!("Upload: {} ({} bytes) saved as {}", original, data.len(), filename);

    tokio::fs::create_dir_all(state.upload_dir()).await?;
    let path = state.upload_dir().join(&filename);
    tokio::fs::write(&path, &data).await?;

    let report = state.ingest().ingest_path(&path).await?;

    Ok(Json(UploadResponse {
        message: "PDF processed and stored in the vector store".to_string(),
        filename,
        file_id: report.file_id.to_string(),
        pages: report.pages,
        chunks: report.chunks,
    }))
}

/// Reduce a client-supplied filename to a safe basename: path components are
/// dropped, whitespace becomes `_`, and anything outside `[A-Za-z0-9._-]` is
/// removed.
pub fn secure_filename(name: &str) -> Result<String> {
    let unsafe_chars = Regex::new(r"[^A-Za-z0-9._-]")
        .map_err(|e| Error::internal(format!("Invalid filename pattern: {}", e)))?;
    let whitespace = Regex::new(r"\s+")
        .map_err(|e| Error::internal(format!("Invalid filename pattern: {}", e)))?;

    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let base = whitespace.replace_all(base.trim(), "_");
    let cleaned = unsafe_chars.replace_all(&base, "");
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();

    if cleaned.is_empty() || Path::new(&cleaned).file_name().is_none() {
        return Err(Error::invalid_input(format!("Invalid filename: {}", name)));
    }
    Ok(cleaned)
}
