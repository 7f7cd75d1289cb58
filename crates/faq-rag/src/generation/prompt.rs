//! Prompt assembly: context selection and message templates

use std::collections::HashSet;

use crate::config::ComposerConfig;

/// System instruction used when the caller supplies no template
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful assistant that answers questions using ONLY the provided context.

RULES:
1. Use only information that is explicitly stated in the context
2. Be concise and answer in the same language as the question
3. If the context does not contain enough information, say so explicitly: "I do not have enough information to answer this question.""#;

/// Prompt builder for completion requests
pub struct PromptBuilder;

impl PromptBuilder {
    /// Pick the chunks that go into the context block: exact duplicates and
    /// chunks shorter than `min_chunk_chars` are dropped, the rest ordered by
    /// descending length (stable) and capped at `max_chunks`.
    pub fn select_chunks<S: AsRef<str>>(chunks: &[S], config: &ComposerConfig) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut selected: Vec<&str> = chunks
            .iter()
            .map(AsRef::as_ref)
            .filter(|c| seen.insert(*c))
            .filter(|c| c.chars().count() >= config.min_chunk_chars)
            .collect();

        selected.sort_by_key(|c| std::cmp::Reverse(c.chars().count()));
        selected.truncate(config.max_chunks);
        selected.into_iter().map(str::to_string).collect()
    }

    /// Join selected chunks with blank lines, truncated to `max_chars`
    /// characters with a trailing `...` when cut
    pub fn build_context(selected: &[String], max_chars: usize) -> String {
        let context = selected.join("\n\n");
        match context.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &context[..idx]),
            None => context,
        }
    }

    /// Caller template if non-blank, otherwise the default instruction
    pub fn system_prompt(template: Option<&str>) -> &str {
        template
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn human_message(context: &str, question: &str) -> String {
        format!("Context: {}\n\nQuestion: {}", context, question)
    }
}
