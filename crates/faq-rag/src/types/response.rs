//! Response types for the JSON endpoints

use serde::{Deserialize, Serialize};

use crate::providers::vector_store::IndexStats;
use crate::types::StoredDocument;

/// An answer with the chunks it was built from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub answer: String,
    /// Exactly the chunks placed in the prompt (or handed to the rule-based answerer)
    pub chunks: Vec<String>,
    pub question: String,
    /// Caller-supplied label, `general` when absent
    pub context: String,
}

/// Counts reported by a finished ingestion run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub chunk_count: usize,
    pub embedding_count: usize,
}

/// Body returned by the process endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub message: String,
    pub chunks_count: usize,
    pub embeddings_count: usize,
}

/// Body returned by the upload endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_name: String,
    pub file_path: String,
    pub size: u64,
}

/// Body returned by `GET /api/pdfs`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentList {
    pub documents: Vec<StoredDocument>,
    pub storage: String,
}

/// Body returned by `POST /api/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub chunks: Vec<String>,
}

/// Body returned by `GET /api/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub initialized: bool,
    pub index_exists: bool,
    pub index_stats: Option<IndexStats>,
}

/// Body returned by `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
