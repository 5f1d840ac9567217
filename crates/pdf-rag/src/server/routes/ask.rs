//! Question answering endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub query: String,
    pub answer: String,
    /// Raw retrieved chunk texts, for debugging
    pub retrieved_chunks: Vec<String>,
}

/// POST /api/ask - Answer a question over the ingested document
pub async fn ask(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>> {
    let Json(request) = payload.map_err(|rejection| Error::invalid_input(rejection.body_text()))?;
    let query = request.query.unwrap_or_default();
    let result = state.query().answer_question(&query).await?;

    Ok(Json(AskResponse {
        query,
        answer: result.answer,
        retrieved_chunks: result.retrieved_chunks,
    }))
}
