//! API routes for the PDF RAG server

pub mod ask;
pub mod upload;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/ask", post(ask::ask))
        // PDF upload with a larger body limit
        .route(
            "/upload_pdf",
            post(upload::upload_pdf).layer(DefaultBodyLimit::max(max_upload_size)),
        )
}
