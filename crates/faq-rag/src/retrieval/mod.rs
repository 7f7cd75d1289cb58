//! Chunk retrieval: keyword relevance scoring

mod scorer;

pub use scorer::{RelevanceScorer, ScoredChunk};
