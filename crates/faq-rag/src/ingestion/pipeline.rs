//! Ingestion pipeline orchestration: extract → chunk → embed → store

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, IngestStage, Result};
use crate::providers::{EmbeddingProvider, TextExtractor, VectorStoreProvider};
use crate::types::{Document, EmbeddedChunk, IngestReport};

use super::chunker::TextChunker;

/// Main ingestion pipeline
///
/// Stages run sequentially; the first failure aborts the run and is
/// reported with its stage. Vectors already written by an aborted run stay
/// in the store; a retry overwrites them because ids are content hashes.
pub struct IngestPipeline {
    extractor: Arc<dyn TextExtractor>,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    /// Texts per embedding request
    batch_size: usize,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        batch_size: usize,
    ) -> Self {
        Self {
            extractor,
            chunker,
            embedder,
            store,
            batch_size: batch_size.max(1),
        }
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Full ingestion of one document
    pub async fn ingest(&self, document: &Document) -> Result<IngestReport> {
        let start = Instant::now();
        let source = document.source.as_str();

        let text = self
            .extractor
            .extract_text(document)
            .await
            .map_err(|e| e.at_stage(IngestStage::Extraction, source))?;

        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            return Err(Error::extraction(source, "no text extracted"));
        }
        tracing::debug!("{}: {} chunks", source, chunks.len());

        let embedded = self
            .embed_chunks(source, chunks)
            .await
            .map_err(|e| e.at_stage(IngestStage::Embedding, source))?;
        let embedding_count = embedded.len();

        self.store
            .store_embeddings(&embedded)
            .await
            .map_err(|e| e.at_stage(IngestStage::Storage, source))?;

        tracing::info!(
            "Ingested {} ({} chunks) in {:.1}s",
            source,
            embedding_count,
            start.elapsed().as_secs_f64()
        );

        Ok(IngestReport {
            chunk_count: embedded.len(),
            embedding_count,
        })
    }

    async fn embed_chunks(&self, source: &str, chunks: Vec<String>) -> Result<Vec<EmbeddedChunk>> {
        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let batch_vectors = self.embedder.embed_batch(batch).await?;
            if batch_vectors.len() != batch.len() {
                return Err(Error::embedding(format!(
                    "{} returned {} vectors for {} chunks",
                    self.embedder.name(),
                    batch_vectors.len(),
                    batch.len()
                )));
            }
            vectors.extend(batch_vectors);
        }

        Ok(chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(position, (text, vector))| {
                EmbeddedChunk::new(text, vector, source, position as u32)
            })
            .collect())
    }
}
