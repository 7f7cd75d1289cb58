//! Document, chunk and index record types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Anything else
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a file name or path
    pub fn from_path(path: &str) -> Self {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Whether the parser can extract text from this type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Display name used in API messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Txt => "TXT",
            Self::Unknown => "file",
        }
    }
}

/// A document to ingest, identified by its storage path or file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path or name as understood by the document store
    pub source: String,
    /// Detected file type
    pub file_type: FileType,
}

impl Document {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let file_type = FileType::from_path(&source);
        Self { source, file_type }
    }

    /// File name component of the source
    pub fn filename(&self) -> &str {
        Path::new(&self.source)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.source)
    }
}

/// A file held by the document store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredDocument {
    /// Original file name
    pub name: String,
    /// Path to pass back to the process endpoints
    pub path: String,
    /// Size in bytes
    pub size: u64,
}

/// Metadata stored next to each vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    /// Chunk text
    pub text: String,
    /// Source document path
    pub source: String,
    /// Position of the chunk within its document
    pub position: u32,
}

/// A chunk with its embedding, ready for the vector store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedChunk {
    /// Content hash of the chunk text
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

impl EmbeddedChunk {
    pub fn new(text: String, vector: Vec<f32>, source: &str, position: u32) -> Self {
        Self {
            id: content_id(&text),
            vector,
            metadata: ChunkMetadata {
                text,
                source: source.to_string(),
                position,
            },
        }
    }
}

/// Stable id derived from chunk content, so re-ingesting overwrites
pub fn content_id(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
