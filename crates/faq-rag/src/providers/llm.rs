//! Completion provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for chat-completion based answer generation
///
/// Implementations:
/// - `OpenAiClient`: OpenAI-compatible `/chat/completions` endpoint
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run one completion with a system instruction and a human message
    async fn complete(&self, system: &str, human: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
