//! Text extractor trait

use async_trait::async_trait;
use crate::error::Result;
use crate::types::Document;

/// Turns a stored document into plain text
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, document: &Document) -> Result<String>;
}
