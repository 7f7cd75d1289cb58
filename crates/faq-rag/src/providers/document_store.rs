//! Document store provider trait for storing raw uploaded files

use async_trait::async_trait;
use crate::error::Result;
use crate::types::StoredDocument;

/// Trait for document storage
///
/// Implementations:
/// - `LocalDocumentStore`: upload directory on disk
/// - `MemoryDocumentStore`: process memory, for ephemeral deployments
#[async_trait]
pub trait DocumentStoreProvider: Send + Sync {
    /// Store a document
    ///
    /// Returns the path to pass back when processing it
    async fn store_document(&self, filename: &str, data: &[u8]) -> Result<String>;

    /// Retrieve document data by the path returned from `store_document`
    async fn get_document(&self, path: &str) -> Result<Vec<u8>>;

    /// List stored documents
    async fn list_documents(&self) -> Result<Vec<StoredDocument>>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
