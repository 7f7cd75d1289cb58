//! Document ingestion pipeline: PDF/TXT parsing, chunking, embedding, storage

mod chunker;
mod parser;
mod pipeline;

pub use chunker::{chunk_texts, ChunkingStrategy, TextChunker};
pub use parser::{FileParser, StoredFileExtractor};
pub use pipeline::IngestPipeline;
