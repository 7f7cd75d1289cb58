//! API routes for the Q&A server

pub mod documents;
pub mod ingest;
pub mod query;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::response::{HealthResponse, StatusResponse};

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        // Uploaded files
        .route("/pdfs", get(documents::list_documents))
        .route(
            "/upload-pdf",
            post(documents::upload_pdf).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/upload-txt",
            post(documents::upload_txt).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Ingestion
        .route("/process-pdf", post(ingest::process_pdf))
        .route("/process-txt", post(ingest::process_txt))
        // Questions
        .route("/ask", post(query::ask))
        .route("/chat", post(query::chat))
        .route("/info", get(info))
}

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "RAG API is running".to_string(),
    })
}

/// GET /api/status - index initialisation and statistics
async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>> {
    let store = state.vector_store();

    let index_exists = store.index_exists().await?;
    let index_stats = if index_exists {
        Some(store.describe_index_stats().await?)
    } else {
        None
    };

    Ok(Json(StatusResponse {
        initialized: state.index().initialized(),
        index_exists,
        index_stats,
    }))
}

/// GET /api/info - endpoint listing
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let config = state.config();
    Json(serde_json::json!({
        "name": "faq-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Document Q&A over uploaded PDF/TXT files and a fixed knowledge base",
        "endpoints": {
            "GET /api/health": "Liveness check",
            "GET /api/status": "Vector index status and statistics",
            "GET /api/pdfs": "List uploaded files",
            "POST /api/upload-pdf": "Upload a PDF (multipart field 'pdf')",
            "POST /api/upload-txt": "Upload a TXT file (multipart field 'txt')",
            "POST /api/process-pdf": "Extract, chunk, embed and index an uploaded PDF",
            "POST /api/process-txt": "Extract, chunk, embed and index an uploaded TXT file",
            "POST /api/ask": "Answer from the knowledge base, or the vector index",
            "POST /api/chat": "Answer from the vector index"
        },
        "backends": {
            "documents": state.documents().name(),
            "vectors": state.vector_store().name(),
            "embeddings": config.embeddings.model,
            "llm": config.llm.model,
            "answer_mode": config.knowledge_base.answer_mode
        }
    }))
}
