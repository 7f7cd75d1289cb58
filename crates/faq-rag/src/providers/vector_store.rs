//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::EmbeddedChunk;

/// Index statistics as reported by the store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Vector dimension
    pub dimension: usize,
    /// Number of stored vectors
    pub total_vector_count: u64,
    /// Fraction of capacity in use (0.0 for unbounded stores)
    pub index_fullness: f32,
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `LocalVectorStore`: in-process cosine index with optional JSON snapshot
/// - `PineconeVectorStore`: hosted Pinecone index over REST
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Whether the backing index exists
    async fn index_exists(&self) -> Result<bool>;

    /// Create the backing index
    async fn create_index(&self) -> Result<()>;

    /// Current index statistics
    async fn describe_index_stats(&self) -> Result<IndexStats>;

    /// Upsert embedded chunks; existing ids are overwritten
    async fn store_embeddings(&self, chunks: &[EmbeddedChunk]) -> Result<()>;

    /// Texts of the chunks most similar to `query`, most similar first
    async fn retrieve_relevant_chunks(&self, query: &str) -> Result<Vec<String>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
