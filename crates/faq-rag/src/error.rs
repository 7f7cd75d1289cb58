//! Error types for the Q&A service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stage of the ingestion pipeline that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    Extraction,
    Embedding,
    Storage,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestStage::Extraction => "extraction",
            IngestStage::Embedding => "embedding",
            IngestStage::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration (chunk sizes, config file contents, addresses)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A required request input is absent
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Text extraction failed
    #[error("Text extraction failed for '{path}': {message}")]
    Extraction { path: String, message: String },

    /// Embedding generation failed
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector store or document store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Chat completion failed
    #[error("Completion failed: {0}")]
    Completion(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a completion error
    pub fn completion(message: impl Into<String>) -> Self {
        Self::Completion(message.into())
    }

    /// Create a missing input error
    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingInput(what.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Ingestion stage this error belongs to, if any
    pub fn stage(&self) -> Option<IngestStage> {
        match self {
            Error::Extraction { .. } => Some(IngestStage::Extraction),
            Error::Embedding(_) => Some(IngestStage::Embedding),
            Error::Storage(_) => Some(IngestStage::Storage),
            _ => None,
        }
    }

    /// Attribute this error to an ingestion stage.
    ///
    /// Errors already carrying that stage, and request-level errors
    /// (missing input, unsupported type), pass through unchanged.
    pub fn at_stage(self, stage: IngestStage, path: &str) -> Self {
        if self.stage() == Some(stage)
            || matches!(self, Error::MissingInput(_) | Error::UnsupportedFileType(_))
        {
            return self;
        }
        let message = self.to_string();
        match stage {
            IngestStage::Extraction => Error::extraction(path, message),
            IngestStage::Embedding => Error::Embedding(message),
            IngestStage::Storage => Error::Storage(message),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::MissingInput(_) | Error::UnsupportedFileType(_) => StatusCode::BAD_REQUEST,
            Error::Extraction { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Embedding(_) | Error::Storage(_) | Error::Completion(_) => StatusCode::BAD_GATEWAY,
            Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
