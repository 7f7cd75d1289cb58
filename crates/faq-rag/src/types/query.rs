//! Request bodies for the JSON endpoints

use serde::Deserialize;

use crate::error::{Error, Result};

/// Body of `POST /api/ask`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskRequest {
    /// The question
    #[serde(default)]
    pub question: Option<String>,
    /// Free-form label echoed back in the answer
    #[serde(default)]
    pub context: Option<String>,
    /// Optional system instruction replacing the default prompt
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// Body of the process endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessRequest {
    /// Path returned by an upload endpoint
    #[serde(default, alias = "pdfPath", alias = "filePath")]
    pub path: Option<String>,
}

/// Trimmed, non-empty value or `MissingInput`
pub fn required(value: Option<&str>, what: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(Error::missing(format!("{} is required", what))),
    }
}
