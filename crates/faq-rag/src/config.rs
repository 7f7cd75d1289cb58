//! Configuration for the Q&A service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::ingestion::ChunkingStrategy;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Upload storage (ephemeral or persistent)
    pub storage: StorageConfig,
    /// Chunking used by document ingestion
    pub chunking: ChunkingConfig,
    /// Keyword relevance scoring weights
    pub scoring: ScoringConfig,
    /// Context assembly for the completion prompt
    pub composer: ComposerConfig,
    /// Embedding API configuration
    pub embeddings: EmbeddingConfig,
    /// Chat completion API configuration
    pub llm: LlmConfig,
    /// Vector database configuration
    pub vector_db: VectorDbConfig,
    /// Fixed knowledge-base file answered without the vector store
    pub knowledge_base: KnowledgeBaseConfig,
}

impl RagConfig {
    /// Load configuration: optional TOML file, then environment overrides,
    /// then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            Error::InvalidConfiguration(format!("{}: {}", path.display(), e))
        })
    }

    /// Override fields from well-known environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = key.clone();
            self.embeddings.api_key = key;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.llm.base_url = url.clone();
            self.embeddings.base_url = url;
        }
        if let Some(key) = lookup("PINECONE_API_KEY") {
            self.vector_db.api_key = key;
            self.vector_db.backend = VectorBackend::Pinecone;
        }
        if let Some(name) = lookup("PINECONE_INDEX_NAME") {
            self.vector_db.index_name = name;
        }
        if let Some(host) = lookup("PINECONE_INDEX_HOST") {
            self.vector_db.index_host = Some(host);
        }
        match lookup("RAG_STORAGE_BACKEND").as_deref() {
            Some("ephemeral") => self.storage.backend = StorageBackend::Ephemeral,
            Some("persistent") => self.storage.backend = StorageBackend::Persistent,
            _ => {}
        }
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        validate_chunking(self.chunking.chunk_size, self.chunking.chunk_overlap)?;
        validate_chunking(
            self.knowledge_base.chunk_size,
            self.knowledge_base.chunk_overlap,
        )?;
        if self.embeddings.batch_size == 0 {
            return Err(Error::InvalidConfiguration(
                "embeddings.batch_size must be greater than 0".to_string(),
            ));
        }
        if self.scoring.max_results == 0 {
            return Err(Error::InvalidConfiguration(
                "scoring.max_results must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Check `0 <= overlap < chunk_size`
pub fn validate_chunking(chunk_size: usize, overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(Error::InvalidConfiguration(
            "chunk size must be greater than 0".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(Error::InvalidConfiguration(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, chunk_size
        )));
    }
    Ok(())
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 20MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            max_upload_size: 20 * 1024 * 1024,
        }
    }
}

/// Where uploaded files live
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Files kept in process memory; lost on restart (serverless deployments)
    Ephemeral,
    /// Files written to `upload_dir`, vectors snapshotted under `data_dir`
    #[default]
    Persistent,
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for uploaded PDF/TXT files
    pub upload_dir: PathBuf,
    /// Directory for the local vector index snapshot
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Persistent,
            upload_dir: PathBuf::from("./pdfs"),
            data_dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("faq-rag"),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Splitting strategy
    pub strategy: ChunkingStrategy,
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkingStrategy::Paragraph,
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Keyword relevance weights
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points per matched topic keyword
    pub category_weight: u32,
    /// Points per question word found in the chunk
    pub word_weight: u32,
    /// Bonus for chunks carrying contact/price/hours markers
    pub marker_bonus: u32,
    /// Only award the marker bonus to chunks that already matched a keyword
    /// or question word; when false every marker chunk gets it
    pub marker_requires_match: bool,
    /// Question words must be longer than this many characters
    pub min_word_chars: usize,
    /// Maximum chunks returned
    pub max_results: usize,
    /// Chunks returned in document order when nothing matches
    pub fallback_count: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            category_weight: 10,
            word_weight: 2,
            marker_bonus: 5,
            marker_requires_match: true,
            min_word_chars: 2,
            max_results: 5,
            fallback_count: 3,
        }
    }
}

/// Prompt context assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Chunks shorter than this are dropped
    pub min_chunk_chars: usize,
    /// Maximum chunks placed in the context
    pub max_chunks: usize,
    /// Character budget of the rendered context
    pub max_context_chars: usize,
    /// Replaces the built-in system instruction when set
    pub prompt_template: Option<String>,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            min_chunk_chars: 10,
            max_chunks: 5,
            max_context_chars: 4000,
            prompt_template: None,
        }
    }
}

/// Embedding API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,
    pub api_key: String,
    /// Model to use
    pub model: String,
    /// Embedding dimensions (1536 for text-embedding-3-small)
    pub dimensions: usize,
    /// Texts per embedding request
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            batch_size: 64,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Chat completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL
    pub base_url: String,
    pub api_key: String,
    /// Generation model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.3,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Vector backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    /// In-process cosine index
    #[default]
    Local,
    /// Hosted Pinecone index
    Pinecone,
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    pub backend: VectorBackend,
    /// Index name
    pub index_name: String,
    /// Chunks returned per similarity query
    pub top_k: usize,
    /// Pinecone API key
    pub api_key: String,
    /// Pinecone control plane URL
    pub control_url: String,
    /// Data plane host; resolved from the control plane when unset
    pub index_host: Option<String>,
    /// Serverless cloud used when creating the index
    pub cloud: String,
    /// Serverless region used when creating the index
    pub region: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Upsert retries after the first attempt
    pub max_retries: u32,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Local,
            index_name: "faq-rag".to_string(),
            top_k: 10,
            api_key: String::new(),
            control_url: "https://api.pinecone.io".to_string(),
            index_host: None,
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// How knowledge-base questions are answered
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Canned topic answers, no network calls
    #[default]
    RuleBased,
    /// Retrieved chunks forwarded to the completion API
    Completion,
}

/// Fixed knowledge-base configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    /// Knowledge-base text file; the general pipeline is used when absent
    pub path: Option<PathBuf>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub answer_mode: AnswerMode,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("./pdfs/nguquan-info.txt")),
            chunk_size: 200,
            chunk_overlap: 50,
            answer_mode: AnswerMode::RuleBased,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RagConfig::default().validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_partial_toml() {
        let config: RagConfig = toml::from_str(
            r#"
            [chunking]
            strategy = "fixed_window"
            chunk_size = 300

            [storage]
            backend = "ephemeral"

            [knowledge_base]
            answer_mode = "completion"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.strategy, ChunkingStrategy::FixedWindow);
        assert_eq!(config.chunking.chunk_size, 300);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.storage.backend, StorageBackend::Ephemeral);
        assert_eq!(config.knowledge_base.answer_mode, AnswerMode::Completion);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_retry_and_scoring_sections() {
        let config: RagConfig = toml::from_str(
            r#"
            [vector_db]
            max_retries = 5

            [scoring]
            marker_requires_match = false
            "#,
        )
        .unwrap();

        assert_eq!(config.vector_db.max_retries, 5);
        assert!(!config.scoring.marker_requires_match);
        assert_eq!(RagConfig::default().vector_db.max_retries, 2);
        assert!(RagConfig::default().scoring.marker_requires_match);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "8088"),
            ("OPENAI_API_KEY", "sk-test"),
            ("PINECONE_API_KEY", "pc-test"),
            ("RAG_STORAGE_BACKEND", "ephemeral"),
        ]
        .into_iter()
        .collect();

        let mut config = RagConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 8088);
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.embeddings.api_key, "sk-test");
        assert_eq!(config.vector_db.backend, VectorBackend::Pinecone);
        assert_eq!(config.storage.backend, StorageBackend::Ephemeral);
    }
}
