//! MedRAG Server Library
//!
//! Medical document backend: PDFs are uploaded, their text is extracted (OCR
//! with a fallback to the embedded text layer), stored in SQLite, and
//! summarized on demand by a hosted language model.
//!
//! # Modules
//!
//! - `pdf`: MuPDF page rendering and text layer
//! - `ocr`: OCR providers (Tesseract CLI, Ollama vision)
//! - `processing`: extraction and text normalization
//! - `db`, `storage`: document records and uploaded files
//! - `summary`: structured analysis through an LLM client
//! - `routes`: HTTP API

pub mod config;
pub mod db;
pub mod error;
pub mod ocr;
pub mod pdf;
pub mod processing;
pub mod routes;
pub mod state;
pub mod storage;
pub mod summary;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the HTTP application
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload_size = state.config().uploads.max_upload_size;

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(routes::documents::router(max_upload_size))
        .nest("/api/summaries", routes::summaries::router())
        .nest("/api", routes::openai::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
