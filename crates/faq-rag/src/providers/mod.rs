//! Provider abstractions for embeddings, completions, vector storage and
//! document storage
//!
//! Trait seams let the server switch between the in-process backends and
//! the hosted ones (OpenAI-compatible API, Pinecone) from configuration.

pub mod document_store;
pub mod embedding;
pub mod extractor;
pub mod llm;
pub mod local;
pub mod openai;
pub mod pinecone;
pub mod vector_store;

pub use document_store::DocumentStoreProvider;
pub use embedding::EmbeddingProvider;
pub use extractor::TextExtractor;
pub use llm::CompletionProvider;
pub use vector_store::{IndexStats, VectorStoreProvider};

use std::time::Duration;
use tokio::time::sleep;

use crate::error::Result;

/// Retry a request with exponential backoff
pub(crate) async fn retry_request<F, Fut, T>(max_retries: u32, what: &str, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries => {
                let delay = Duration::from_secs(2u64.pow(attempt));
                tracing::warn!(
                    "{} request failed (attempt {}/{}): {}, retrying in {:?}",
                    what,
                    attempt + 1,
                    max_retries + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
