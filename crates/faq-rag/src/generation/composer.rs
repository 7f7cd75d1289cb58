//! Answer composition: context assembly plus one completion call

use std::sync::Arc;

use crate::config::ComposerConfig;
use crate::providers::CompletionProvider;
use crate::types::Answer;

use super::fallback::COMPLETION_APOLOGY;
use super::prompt::PromptBuilder;

/// Label used when the caller supplies no context label
const DEFAULT_CONTEXT_LABEL: &str = "general";

/// Builds prompts from retrieved chunks and asks the completion provider
pub struct AnswerComposer {
    llm: Arc<dyn CompletionProvider>,
    config: ComposerConfig,
}

impl AnswerComposer {
    pub fn new(llm: Arc<dyn CompletionProvider>, config: ComposerConfig) -> Self {
        Self { llm, config }
    }

    /// Answer text for a question; completion failures yield the apology
    pub async fn compose<S: AsRef<str>>(
        &self,
        question: &str,
        chunks: &[S],
        template: Option<&str>,
    ) -> String {
        let selected = PromptBuilder::select_chunks(chunks, &self.config);
        self.complete(question, &selected, template).await
    }

    /// Like [`compose`](Self::compose), also returning the chunks that were
    /// placed in the prompt
    pub async fn answer<S: AsRef<str>>(
        &self,
        question: &str,
        chunks: &[S],
        template: Option<&str>,
        context_label: Option<&str>,
    ) -> Answer {
        let selected = PromptBuilder::select_chunks(chunks, &self.config);
        let answer = self.complete(question, &selected, template).await;

        Answer {
            answer,
            chunks: selected,
            question: question.to_string(),
            context: context_label
                .filter(|c| !c.trim().is_empty())
                .unwrap_or(DEFAULT_CONTEXT_LABEL)
                .to_string(),
        }
    }

    async fn complete(&self, question: &str, selected: &[String], template: Option<&str>) -> String {
        let context = PromptBuilder::build_context(selected, self.config.max_context_chars);
        let system = PromptBuilder::system_prompt(template.or(self.config.prompt_template.as_deref()));
        let human = PromptBuilder::human_message(&context, question);

        tracing::debug!(
            "Composing answer from {} chunks ({} context chars) with {}",
            selected.len(),
            context.chars().count(),
            self.llm.model()
        );

        match self.llm.complete(system, &human).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!("Completion via {} failed: {}", self.llm.name(), e);
                COMPLETION_APOLOGY.to_string()
            }
        }
    }
}
