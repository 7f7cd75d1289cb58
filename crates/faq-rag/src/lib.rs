//! faq-rag: document Q&A over uploaded PDF/TXT files and a fixed FAQ knowledge base
//!
//! Uploaded files are chunked, embedded and indexed in a vector store
//! (local or Pinecone). Questions are answered from a keyword-scored
//! knowledge base when one is present, otherwise from retrieved chunks
//! passed to an OpenAI-compatible completion API.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod qa;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::{rule_based_answer, AnswerComposer};
pub use ingestion::{IngestPipeline, TextChunker};
pub use qa::{KnowledgeBase, QaService};
pub use retrieval::RelevanceScorer;
pub use types::{Answer, Document, FileType, Topic};
