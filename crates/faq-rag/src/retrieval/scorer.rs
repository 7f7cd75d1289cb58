//! Keyword relevance scoring for retrieved or freshly chunked text

use std::collections::BTreeSet;

use crate::config::ScoringConfig;
use crate::types::topic::{Topic, INFO_MARKERS};

/// A chunk with its keyword score and original position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredChunk<'a> {
    pub text: &'a str,
    pub score: u32,
    pub position: usize,
}

/// Terms extracted from one question, reused for every chunk
struct QueryTerms {
    /// Union of keywords of every topic the question mentions
    keywords: Vec<&'static str>,
    /// Distinct question words longer than the configured minimum
    words: Vec<String>,
}

/// Ranks chunks by keyword overlap with a question
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    config: ScoringConfig,
}

impl RelevanceScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    fn terms(&self, question: &str) -> QueryTerms {
        let question_lower = question.to_lowercase();

        let keywords: BTreeSet<&'static str> = Topic::detect_all(&question_lower)
            .into_iter()
            .flat_map(|topic| topic.keywords().iter().copied())
            .collect();

        let mut words: Vec<String> = Vec::new();
        for word in question_lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        {
            if word.chars().count() > self.config.min_word_chars && !words.iter().any(|w| w == word) {
                words.push(word.to_string());
            }
        }

        QueryTerms {
            keywords: keywords.into_iter().collect(),
            words,
        }
    }

    fn score_text(&self, terms: &QueryTerms, chunk: &str) -> u32 {
        let chunk_lower = chunk.to_lowercase();

        let keyword_hits = terms
            .keywords
            .iter()
            .filter(|k| chunk_lower.contains(*k))
            .count() as u32;
        let word_hits = terms
            .words
            .iter()
            .filter(|w| chunk_lower.contains(w.as_str()))
            .count() as u32;

        let score = keyword_hits * self.config.category_weight + word_hits * self.config.word_weight;
        let eligible = score > 0 || !self.config.marker_requires_match;
        if eligible && INFO_MARKERS.iter().any(|m| chunk_lower.contains(m)) {
            score + self.config.marker_bonus
        } else {
            score
        }
    }

    /// Chunks with a positive score, best first, at most `max_results`.
    /// Equal scores keep their original order.
    pub fn rank<'a, S: AsRef<str>>(&self, question: &str, chunks: &'a [S]) -> Vec<ScoredChunk<'a>> {
        let terms = self.terms(question);

        let mut scored: Vec<ScoredChunk<'a>> = chunks
            .iter()
            .enumerate()
            .map(|(position, chunk)| ScoredChunk {
                text: chunk.as_ref(),
                score: self.score_text(&terms, chunk.as_ref()),
                position,
            })
            .filter(|c| c.score > 0)
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(self.config.max_results);
        scored
    }

    /// Best chunks for a question; falls back to the first
    /// `fallback_count` chunks in document order when nothing matches
    pub fn score<S: AsRef<str>>(&self, question: &str, chunks: &[S]) -> Vec<String> {
        let ranked = self.rank(question, chunks);
        if ranked.is_empty() {
            tracing::debug!("No keyword matches, using first {} chunks", self.config.fallback_count);
            return chunks
                .iter()
                .take(self.config.fallback_count)
                .map(|c| c.as_ref().to_string())
                .collect();
        }

        ranked.into_iter().map(|c| c.text.to_string()).collect()
    }
}
