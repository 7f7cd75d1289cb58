//! Application state for the Q&A server

use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::{RagConfig, StorageBackend, VectorBackend};
use crate::error::Result;
use crate::generation::AnswerComposer;
use crate::ingestion::{ChunkingStrategy, IngestPipeline, StoredFileExtractor, TextChunker};
use crate::providers::{
    local::{LocalDocumentStore, LocalVectorStore, MemoryDocumentStore},
    openai::OpenAiClient,
    pinecone::PineconeVectorStore,
    CompletionProvider, DocumentStoreProvider, EmbeddingProvider, VectorStoreProvider,
};
use crate::qa::{KnowledgeBase, QaService};
use crate::retrieval::RelevanceScorer;

/// Index existence check and creation, run at most once per process.
///
/// A failed attempt leaves the cell empty so the next caller retries.
pub struct IndexInitializer {
    store: Arc<dyn VectorStoreProvider>,
    cell: OnceCell<()>,
}

impl IndexInitializer {
    pub fn new(store: Arc<dyn VectorStoreProvider>) -> Self {
        Self {
            store,
            cell: OnceCell::new(),
        }
    }

    /// Make sure the index exists
    pub async fn ensure(&self) -> Result<()> {
        self.cell
            .get_or_try_init(|| async {
                if self.store.index_exists().await? {
                    let stats = self.store.describe_index_stats().await?;
                    tracing::info!(
                        "Index ready on {} ({} vectors, dimension {})",
                        self.store.name(),
                        stats.total_vector_count,
                        stats.dimension
                    );
                } else {
                    self.store.create_index().await?;
                    tracing::info!("Index created on {}", self.store.name());
                }
                Ok(())
            })
            .await
            .map(|_| ())
    }

    pub fn initialized(&self) -> bool {
        self.cell.initialized()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Uploaded files (upload directory or memory)
    documents: Arc<dyn DocumentStoreProvider>,
    /// Vector index (local or Pinecone)
    vector_store: Arc<dyn VectorStoreProvider>,
    /// Extract → chunk → embed → store
    pipeline: IngestPipeline,
    /// Knowledge-base and vector question answering
    qa: QaService,
    /// Once-only index initialisation
    index: IndexInitializer,
}

impl AppState {
    /// Create application state with the backends selected by `config`
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!(
            "Initializing application state (storage: {:?}, vectors: {:?})...",
            config.storage.backend,
            config.vector_db.backend
        );

        let openai = Arc::new(OpenAiClient::new(&config.embeddings, &config.llm)?);
        let embedder: Arc<dyn EmbeddingProvider> = openai.clone();
        let llm: Arc<dyn CompletionProvider> = openai;
        tracing::info!(
            "OpenAI-compatible client initialized (embeddings: {}, llm: {})",
            config.embeddings.model,
            config.llm.model
        );

        let documents: Arc<dyn DocumentStoreProvider> = match config.storage.backend {
            StorageBackend::Persistent => {
                Arc::new(LocalDocumentStore::new(config.storage.upload_dir.clone())?)
            }
            StorageBackend::Ephemeral => Arc::new(MemoryDocumentStore::new()),
        };

        let vector_store: Arc<dyn VectorStoreProvider> = match config.vector_db.backend {
            VectorBackend::Local => match config.storage.backend {
                StorageBackend::Persistent => Arc::new(LocalVectorStore::persistent(
                    embedder.clone(),
                    config.vector_db.top_k,
                    config.storage.data_dir.join("vectors.json"),
                )?),
                StorageBackend::Ephemeral => Arc::new(LocalVectorStore::in_memory(
                    embedder.clone(),
                    config.vector_db.top_k,
                )),
            },
            VectorBackend::Pinecone => {
                Arc::new(PineconeVectorStore::new(&config.vector_db, embedder.clone())?)
            }
        };
        tracing::info!(
            "Stores initialized (documents: {}, vectors: {})",
            documents.name(),
            vector_store.name()
        );

        Self::from_parts(config, documents, vector_store, embedder, llm)
    }

    /// Assemble state from already constructed providers
    pub fn from_parts(
        config: RagConfig,
        documents: Arc<dyn DocumentStoreProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn CompletionProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let pipeline = IngestPipeline::new(
            Arc::new(StoredFileExtractor::new(documents.clone())),
            TextChunker::from_config(&config.chunking)?,
            embedder,
            vector_store.clone(),
            config.embeddings.batch_size,
        );

        let kb = &config.knowledge_base;
        let knowledge_base = match &kb.path {
            Some(path) => {
                let chunker =
                    TextChunker::new(kb.chunk_size, kb.chunk_overlap, ChunkingStrategy::FixedWindow)?;
                tracing::info!("Knowledge base: {}", path.display());
                Some(KnowledgeBase::new(path.clone(), chunker))
            }
            None => None,
        };

        let qa = QaService::new(
            knowledge_base,
            kb.answer_mode,
            RelevanceScorer::new(config.scoring.clone()),
            AnswerComposer::new(llm, config.composer.clone()),
            vector_store.clone(),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                index: IndexInitializer::new(vector_store.clone()),
                config,
                documents,
                vector_store,
                pipeline,
                qa,
            }),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStoreProvider> {
        &self.inner.documents
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.inner.vector_store
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn qa(&self) -> &QaService {
        &self.inner.qa
    }

    pub fn index(&self) -> &IndexInitializer {
        &self.inner.index
    }
}
