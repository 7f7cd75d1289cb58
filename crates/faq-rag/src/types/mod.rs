//! Core types for the Q&A service

pub mod document;
pub mod query;
pub mod response;
pub mod topic;

pub use document::{ChunkMetadata, Document, EmbeddedChunk, FileType, StoredDocument};
pub use query::{AskRequest, ChatRequest, ProcessRequest};
pub use response::{Answer, IngestReport};
pub use topic::Topic;
