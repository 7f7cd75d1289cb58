//! In-process provider implementations: cosine vector index and
//! filesystem / in-memory document storage

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{EmbeddedChunk, FileType, StoredDocument};

use super::document_store::DocumentStoreProvider;
use super::embedding::EmbeddingProvider;
use super::vector_store::{IndexStats, VectorStoreProvider};

/// On-disk snapshot layout
#[derive(Deserialize)]
struct IndexSnapshot {
    vectors: Vec<EmbeddedChunk>,
}

#[derive(Serialize)]
struct IndexSnapshotRef<'a> {
    vectors: Vec<&'a EmbeddedChunk>,
}

#[derive(Default)]
struct LocalIndex {
    created: bool,
    vectors: HashMap<String, EmbeddedChunk>,
}

/// Local vector store: brute-force cosine similarity over an in-memory map
///
/// With a snapshot path the index is loaded on construction and rewritten
/// after every upsert, so vectors survive restarts.
pub struct LocalVectorStore {
    index: RwLock<LocalIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    snapshot: Option<PathBuf>,
    /// Serialises snapshot writes, which share one temp file
    snapshot_lock: tokio::sync::Mutex<()>,
}

impl LocalVectorStore {
    /// Create a store that only lives in memory
    pub fn in_memory(embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            index: RwLock::new(LocalIndex::default()),
            embedder,
            top_k: top_k.max(1),
            snapshot: None,
            snapshot_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Create a store backed by a JSON snapshot, loading it when present
    pub fn persistent(
        embedder: Arc<dyn EmbeddingProvider>,
        top_k: usize,
        snapshot: PathBuf,
    ) -> Result<Self> {
        let mut index = LocalIndex::default();
        if snapshot.exists() {
            let content = std::fs::read(&snapshot)?;
            let loaded: IndexSnapshot = serde_json::from_slice(&content)?;
            index.created = true;
            index.vectors = loaded
                .vectors
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect();
            tracing::info!(
                "Loaded {} vectors from {}",
                index.vectors.len(),
                snapshot.display()
            );
        }

        Ok(Self {
            index: RwLock::new(index),
            embedder,
            top_k: top_k.max(1),
            snapshot: Some(snapshot),
            snapshot_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.index.read().vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn save_snapshot(&self) -> Result<()> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        // Held across serialise, write and rename so the last writer
        // publishes a complete snapshot of the latest index
        let _guard = self.snapshot_lock.lock().await;
        let json = {
            let index = self.index.read();
            let mut vectors: Vec<&EmbeddedChunk> = index.vectors.values().collect();
            vectors.sort_by(|a, b| {
                a.metadata
                    .source
                    .cmp(&b.metadata.source)
                    .then(a.metadata.position.cmp(&b.metadata.position))
            });
            serde_json::to_vec(&IndexSnapshotRef { vectors })?
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn index_exists(&self) -> Result<bool> {
        Ok(self.index.read().created)
    }

    async fn create_index(&self) -> Result<()> {
        self.index.write().created = true;
        self.save_snapshot()
            .await
            .map_err(|e| Error::storage(format!("Failed to write index snapshot: {}", e)))
    }

    async fn describe_index_stats(&self) -> Result<IndexStats> {
        let index = self.index.read();
        let dimension = index
            .vectors
            .values()
            .next()
            .map(|c| c.vector.len())
            .unwrap_or_else(|| self.embedder.dimensions());
        Ok(IndexStats {
            dimension,
            total_vector_count: index.vectors.len() as u64,
            index_fullness: 0.0,
        })
    }

    async fn store_embeddings(&self, chunks: &[EmbeddedChunk]) -> Result<()> {
        {
            let mut index = self.index.write();
            let expected = index.vectors.values().next().map(|c| c.vector.len());
            if let Some(bad) = chunks
                .iter()
                .find(|c| expected.is_some_and(|dim| dim != c.vector.len()))
            {
                return Err(Error::storage(format!(
                    "vector dimension {} does not match index dimension {}",
                    bad.vector.len(),
                    expected.unwrap_or_default()
                )));
            }

            index.created = true;
            for chunk in chunks {
                index.vectors.insert(chunk.id.clone(), chunk.clone());
            }
        }

        self.save_snapshot()
            .await
            .map_err(|e| Error::storage(format!("Failed to write index snapshot: {}", e)))
    }

    async fn retrieve_relevant_chunks(&self, query: &str) -> Result<Vec<String>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query).await?;

        let index = self.index.read();
        let mut scored: Vec<(f32, &EmbeddedChunk)> = index
            .vectors
            .values()
            .map(|c| (cosine_similarity(&query_vector, &c.vector), c))
            .collect();
        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.metadata.source.cmp(&b.1.metadata.source))
                .then(a.1.metadata.position.cmp(&b.1.metadata.position))
        });

        Ok(scored
            .into_iter()
            .take(self.top_k)
            .map(|(_, c)| c.metadata.text.clone())
            .collect())
    }

    fn name(&self) -> &str {
        "local-cosine"
    }
}

/// File name component of an upload name or stored path
fn sanitize_name(name: &str) -> Result<String> {
    Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::missing("file name is required"))
}

/// Local document store using the upload directory
pub struct LocalDocumentStore {
    /// Directory to store documents
    storage_dir: PathBuf,
}

impl LocalDocumentStore {
    /// Create a new local document store
    pub fn new(storage_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&storage_dir)?;
        Ok(Self { storage_dir })
    }

    /// Get path for a document; only the file name of `name` is used
    fn doc_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.storage_dir.join(sanitize_name(name)?))
    }
}

#[async_trait]
impl DocumentStoreProvider for LocalDocumentStore {
    async fn store_document(&self, filename: &str, data: &[u8]) -> Result<String> {
        let doc_path = self.doc_path(filename)?;
        tokio::fs::write(&doc_path, data).await.map_err(|e| {
            Error::storage(format!("Failed to write {}: {}", doc_path.display(), e))
        })?;
        Ok(doc_path.to_string_lossy().to_string())
    }

    async fn get_document(&self, path: &str) -> Result<Vec<u8>> {
        let doc_path = self.doc_path(path)?;
        tokio::fs::read(&doc_path)
            .await
            .map_err(|e| Error::storage(format!("Failed to read document {}: {}", path, e)))
    }

    async fn list_documents(&self) -> Result<Vec<StoredDocument>> {
        let mut docs = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.storage_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(docs),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !FileType::from_path(name).is_supported() {
                continue;
            }
            let size = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
            docs.push(StoredDocument {
                name: name.to_string(),
                path: path.to_string_lossy().to_string(),
                size,
            });
        }

        docs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(docs)
    }

    fn name(&self) -> &str {
        "local-filesystem"
    }
}

/// Document store kept in process memory; contents are lost on restart
#[derive(Default)]
pub struct MemoryDocumentStore {
    files: DashMap<String, Vec<u8>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStoreProvider for MemoryDocumentStore {
    async fn store_document(&self, filename: &str, data: &[u8]) -> Result<String> {
        let name = sanitize_name(filename)?;
        self.files.insert(name.clone(), data.to_vec());
        Ok(name)
    }

    async fn get_document(&self, path: &str) -> Result<Vec<u8>> {
        let name = sanitize_name(path)?;
        self.files
            .get(&name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::storage(format!("Document not found: {}", path)))
    }

    async fn list_documents(&self) -> Result<Vec<StoredDocument>> {
        let mut docs: Vec<StoredDocument> = self
            .files
            .iter()
            .map(|entry| StoredDocument {
                name: entry.key().clone(),
                path: entry.key().clone(),
                size: entry.value().len() as u64,
            })
            .collect();
        docs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(docs)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Maps a few known words to fixed directions
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        t.contains("hotline") as u8 as f32,
                        t.contains("giờ") as u8 as f32,
                        t.contains("cá") as u8 as f32,
                    ]
                })
                .collect())
        }

        fn dimensions(&self) -> usize {
            3
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    fn chunk(text: &str, vector: Vec<f32>, position: u32) -> EmbeddedChunk {
        EmbeddedChunk::new(text.to_string(), vector, "info.txt", position)
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_retrieve_most_similar_first() {
        let store = LocalVectorStore::in_memory(Arc::new(KeywordEmbedder), 2);
        assert!(!store.index_exists().await.unwrap());
        store.create_index().await.unwrap();

        store
            .store_embeddings(&[
                chunk("Hotline: 0382 699 866", vec![1.0, 0.0, 0.0], 0),
                chunk("Giờ mở cửa: 10:00 - 22:00", vec![0.0, 1.0, 0.0], 1),
                chunk("Cá lăng, cá chình", vec![0.0, 0.0, 1.0], 2),
            ])
            .await
            .unwrap();

        let results = store.retrieve_relevant_chunks("số hotline?").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], "Hotline: 0382 699 866");

        let stats = store.describe_index_stats().await.unwrap();
        assert_eq!(stats.dimension, 3);
        assert_eq!(stats.total_vector_count, 3);
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_content() {
        let store = LocalVectorStore::in_memory(Arc::new(KeywordEmbedder), 5);
        let batch = [chunk("Hotline: 0382 699 866", vec![1.0, 0.0, 0.0], 0)];
        store.store_embeddings(&batch).await.unwrap();
        store.store_embeddings(&batch).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_dimension_mismatch() {
        let store = LocalVectorStore::in_memory(Arc::new(KeywordEmbedder), 5);
        store
            .store_embeddings(&[chunk("a", vec![1.0, 0.0, 0.0], 0)])
            .await
            .unwrap();
        let err = store
            .store_embeddings(&[chunk("b", vec![1.0], 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn test_empty_store_retrieves_nothing() {
        let store = LocalVectorStore::in_memory(Arc::new(KeywordEmbedder), 5);
        assert!(store.retrieve_relevant_chunks("hotline").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index").join("vectors.json");

        let store = LocalVectorStore::persistent(Arc::new(KeywordEmbedder), 5, path.clone()).unwrap();
        store
            .store_embeddings(&[chunk("Cá lăng nướng", vec![0.0, 0.0, 1.0], 0)])
            .await
            .unwrap();

        let reloaded = LocalVectorStore::persistent(Arc::new(KeywordEmbedder), 5, path).unwrap();
        assert!(reloaded.index_exists().await.unwrap());
        assert_eq!(reloaded.len(), 1);
        assert_eq!(
            reloaded.retrieve_relevant_chunks("món cá").await.unwrap(),
            vec!["Cá lăng nướng"]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_all_reach_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("vectors.json");
        let store = Arc::new(
            LocalVectorStore::persistent(Arc::new(KeywordEmbedder), 5, path.clone()).unwrap(),
        );

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let text = format!("Món số {}", i);
                    store
                        .store_embeddings(&[chunk(&text, vec![0.0, 0.0, 1.0], i)])
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(!path.with_extension("json.tmp").exists());
        let reloaded = LocalVectorStore::persistent(Arc::new(KeywordEmbedder), 5, path).unwrap();
        assert_eq!(reloaded.len(), 8);
    }

    #[tokio::test]
    async fn test_local_document_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path().join("pdfs")).unwrap();

        let path = store
            .store_document("../nguquan-info.txt", "Hotline: 0382 699 866".as_bytes())
            .await
            .unwrap();
        assert!(path.ends_with("nguquan-info.txt"));
        assert!(Path::new(&path).starts_with(dir.path()));

        store.store_document("notes.md", b"ignored").await.unwrap();

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "nguquan-info.txt");
        assert_eq!(docs[0].size, "Hotline: 0382 699 866".len() as u64);

        let data = store.get_document(&path).await.unwrap();
        assert_eq!(data, "Hotline: 0382 699 866".as_bytes());
    }

    #[tokio::test]
    async fn test_memory_document_store() {
        let store = MemoryDocumentStore::new();
        let path = store.store_document("menu.pdf", b"%PDF").await.unwrap();
        assert_eq!(path, "menu.pdf");
        assert_eq!(store.get_document("pdfs/menu.pdf").await.unwrap(), b"%PDF");
        assert!(store.get_document("other.pdf").await.is_err());
        assert!(matches!(
            store.store_document("  ", b"x").await,
            Err(Error::MissingInput(_))
        ));
    }
}
