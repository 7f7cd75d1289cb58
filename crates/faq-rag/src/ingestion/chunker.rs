//! Text chunking with fixed-window and paragraph-aware strategies
//!
//! Sizes are measured in characters, not bytes, so multi-byte text
//! (Vietnamese diacritics in particular) never splits inside a code point.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{validate_chunking, ChunkingConfig};
use crate::error::Result;

static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence pattern is valid"));

/// How text is split into chunks
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Window of `chunk_size` characters advancing by `chunk_size - overlap`
    FixedWindow,
    /// Paragraphs packed up to `chunk_size`, neighbours spliced in as overlap
    #[default]
    Paragraph,
}

/// Text chunker with configurable size, overlap and strategy
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks in characters
    overlap: usize,
    strategy: ChunkingStrategy,
}

impl TextChunker {
    /// Create a new chunker; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize, strategy: ChunkingStrategy) -> Result<Self> {
        validate_chunking(chunk_size, overlap)?;
        Ok(Self {
            chunk_size,
            overlap,
            strategy,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap, config.strategy)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn strategy(&self) -> ChunkingStrategy {
        self.strategy
    }

    /// Chunk a single text
    pub fn chunk(&self, text: &str) -> Vec<String> {
        match self.strategy {
            ChunkingStrategy::FixedWindow => self.fixed_window(text),
            ChunkingStrategy::Paragraph => self.paragraphs(text),
        }
    }

    /// Chunk several texts joined with newlines
    pub fn chunk_parts<S: AsRef<str>>(&self, parts: &[S]) -> Vec<String> {
        let joined = parts
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n");
        self.chunk(&joined)
    }

    fn fixed_window(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let window: String = chars[start..end].iter().collect();
            if !window.trim().is_empty() {
                chunks.push(window);
            }
            start += step;
        }

        chunks
    }

    fn paragraphs(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut buffer = String::new();

        for paragraph in text.split('\n').filter(|p| !p.trim().is_empty()) {
            if char_len(paragraph) > self.chunk_size {
                // Too long on its own: pack its sentences instead
                for sentence in SENTENCE_END
                    .split(paragraph)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                {
                    self.accumulate(&mut chunks, &mut buffer, sentence, ' ');
                }
            } else {
                self.accumulate(&mut chunks, &mut buffer, paragraph, '\n');
            }
        }
        flush(&mut chunks, &buffer);

        if self.overlap == 0 {
            return chunks;
        }
        self.splice_neighbours(&chunks)
    }

    fn accumulate(&self, chunks: &mut Vec<String>, buffer: &mut String, piece: &str, sep: char) {
        if char_len(buffer) + char_len(piece) > self.chunk_size {
            flush(chunks, buffer);
            *buffer = piece.to_string();
        } else {
            if !buffer.is_empty() {
                buffer.push(sep);
            }
            buffer.push_str(piece);
        }
    }

    /// Prefix each chunk with the tail of its predecessor and suffix it
    /// with the head of its successor
    fn splice_neighbours(&self, chunks: &[String]) -> Vec<String> {
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let mut spliced = String::new();
                if i > 0 {
                    spliced.push_str(tail_chars(&chunks[i - 1], self.overlap));
                    spliced.push('\n');
                }
                spliced.push_str(chunk);
                if let Some(next) = chunks.get(i + 1) {
                    spliced.push('\n');
                    spliced.push_str(head_chars(next, self.overlap));
                }
                spliced
            })
            .collect()
    }
}

/// Chunk `text` with the given parameters
pub fn chunk_texts(
    text: &str,
    chunk_size: usize,
    overlap: usize,
    strategy: ChunkingStrategy,
) -> Result<Vec<String>> {
    Ok(TextChunker::new(chunk_size, overlap, strategy)?.chunk(text))
}

fn flush(chunks: &mut Vec<String>, buffer: &str) {
    let trimmed = buffer.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn head_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn tail_chars(s: &str, n: usize) -> &str {
    let len = char_len(s);
    if len <= n {
        return s;
    }
    match s.char_indices().nth(len - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use proptest::prelude::*;

    const SAMPLE: &str = "Hotline: 0382699866\nAddress: 123 Main St\nHours: 10-22";

    fn fixed(size: usize, overlap: usize) -> TextChunker {
        TextChunker::new(size, overlap, ChunkingStrategy::FixedWindow).unwrap()
    }

    fn paragraph(size: usize, overlap: usize) -> TextChunker {
        TextChunker::new(size, overlap, ChunkingStrategy::Paragraph).unwrap()
    }

    /// Undo fixed-window overlap: every chunk after the first repeats
    /// `overlap` characters of its predecessor
    fn reconstruct(chunks: &[String], overlap: usize) -> String {
        let mut out = String::new();
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push_str(chunk);
            } else {
                out.extend(chunk.chars().skip(overlap));
            }
        }
        out
    }

    #[test]
    fn test_empty_input() {
        assert!(fixed(1000, 200).chunk("").is_empty());
        assert!(paragraph(1000, 200).chunk("").is_empty());
        assert!(paragraph(1000, 200).chunk(" \n\n \n").is_empty());
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        for strategy in [ChunkingStrategy::FixedWindow, ChunkingStrategy::Paragraph] {
            assert!(matches!(
                TextChunker::new(100, 100, strategy),
                Err(Error::InvalidConfiguration(_))
            ));
            assert!(matches!(
                TextChunker::new(100, 150, strategy),
                Err(Error::InvalidConfiguration(_))
            ));
        }
        assert!(matches!(
            chunk_texts("abc", 0, 0, ChunkingStrategy::FixedWindow),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_fixed_window_steps() {
        let chunks = fixed(4, 1).chunk("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "defg", "ghij", "j"]);
        assert_eq!(reconstruct(&chunks, 1), "abcdefghij");
    }

    #[test]
    fn test_fixed_window_multibyte() {
        let text = "Ngư Quán chuyên cá lăng, cá chình";
        let chunks = fixed(7, 2).chunk(text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 7));
        assert_eq!(reconstruct(&chunks, 2), text);
    }

    #[test]
    fn test_fixed_window_drops_blank_windows() {
        let chunks = fixed(3, 0).chunk("abc      def");
        assert_eq!(chunks, vec!["abc", "def"]);
    }

    #[test]
    fn test_paragraph_packing() {
        let text = "one\ntwo\nthree\nfour";
        let chunks = paragraph(9, 0).chunk(text);
        assert_eq!(chunks, vec!["one\ntwo", "three\nfour"]);
    }

    #[test]
    fn test_paragraph_long_paragraph_splits_on_sentences() {
        let text = "First sentence here. Second one! Third?";
        let chunks = paragraph(20, 0).chunk(text);
        assert_eq!(
            chunks,
            vec!["First sentence here", "Second one Third"]
        );
        assert!(chunks.iter().all(|c| !c.contains('.') && !c.contains('!')));
    }

    #[test]
    fn test_paragraph_overlap_splice() {
        let chunks = paragraph(5, 2).chunk("aaaaa\nbbbbb\nccccc");
        assert_eq!(
            chunks,
            vec!["aaaaa\nbb", "aa\nbbbbb\ncc", "bb\nccccc"]
        );
    }

    #[test]
    fn test_sample_document_both_strategies() {
        for chunker in [fixed(30, 5), paragraph(30, 5)] {
            let chunks = chunker.chunk(SAMPLE);
            assert!(chunks.len() >= 2, "{:?}", chunker.strategy());
            for chunk in &chunks {
                assert!(!chunk.trim().is_empty());
                assert!(chunk.chars().count() <= 35, "{:?}", chunk);
            }
        }
    }

    #[test]
    fn test_chunk_parts_joins_with_newlines() {
        let chunker = paragraph(1000, 0);
        let chunks = chunker.chunk_parts(&["Hotline: 0382 699 866", "Giờ mở cửa: 10:00 - 22:00"]);
        assert_eq!(
            chunks,
            vec!["Hotline: 0382 699 866\nGiờ mở cửa: 10:00 - 22:00"]
        );
    }

    #[test]
    fn test_tail_and_head_chars() {
        assert_eq!(tail_chars("cá lăng", 4), "lăng");
        assert_eq!(head_chars("cá lăng", 2), "cá");
        assert_eq!(tail_chars("ab", 5), "ab");
        assert_eq!(head_chars("ab", 5), "ab");
    }

    fn size_and_overlap() -> impl Strategy<Value = (usize, usize)> {
        (1usize..60).prop_flat_map(|size| (Just(size), 0..size))
    }

    proptest! {
        #[test]
        fn prop_fixed_window_reconstructs(
            text in "[a-z0-9đăơưáàạ]{0,300}",
            (size, overlap) in size_and_overlap(),
        ) {
            let chunks = fixed(size, overlap).chunk(&text);
            prop_assert_eq!(reconstruct(&chunks, overlap), text);
            prop_assert!(chunks.iter().all(|c| !c.is_empty() && c.chars().count() <= size));
        }

        #[test]
        fn prop_paragraph_chunks_never_empty(
            text in "[a-z .!?\n]{0,300}",
            (size, overlap) in size_and_overlap(),
        ) {
            let chunks = paragraph(size, overlap).chunk(&text);
            prop_assert!(chunks.iter().all(|c| !c.trim().is_empty()));
        }
    }
}
