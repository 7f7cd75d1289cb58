//! Question answering: fixed knowledge base first, vector retrieval otherwise

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AnswerMode;
use crate::error::Result;
use crate::generation::fallback::{GENERIC_APOLOGY, NO_DOCUMENTS, NO_RELEVANT_CHUNKS};
use crate::generation::{rule_based_answer, AnswerComposer};
use crate::ingestion::TextChunker;
use crate::providers::VectorStoreProvider;
use crate::retrieval::RelevanceScorer;
use crate::types::Answer;

/// A plain-text file answered by keyword scoring, without the vector store
pub struct KnowledgeBase {
    path: PathBuf,
    chunker: TextChunker,
}

impl KnowledgeBase {
    pub fn new(path: PathBuf, chunker: TextChunker) -> Self {
        Self { path, chunker }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Chunks of the file, or `None` when it does not exist.
    ///
    /// Read on every call so an uploaded replacement takes effect without a
    /// restart. Invalid UTF-8 is replaced rather than rejected.
    pub async fn chunks(&self) -> Result<Option<Vec<String>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(self.chunker.chunk(&String::from_utf8_lossy(&bytes)))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Answers questions against the knowledge base or the vector index
pub struct QaService {
    knowledge_base: Option<KnowledgeBase>,
    answer_mode: AnswerMode,
    scorer: RelevanceScorer,
    composer: AnswerComposer,
    vector_store: Arc<dyn VectorStoreProvider>,
}

impl QaService {
    pub fn new(
        knowledge_base: Option<KnowledgeBase>,
        answer_mode: AnswerMode,
        scorer: RelevanceScorer,
        composer: AnswerComposer,
        vector_store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        Self {
            knowledge_base,
            answer_mode,
            scorer,
            composer,
            vector_store,
        }
    }

    /// Knowledge-base chunks, if a knowledge base is configured and present
    async fn knowledge_chunks(&self) -> Result<Option<Vec<String>>> {
        match &self.knowledge_base {
            Some(kb) => kb.chunks().await,
            None => Ok(None),
        }
    }

    /// Answer from the knowledge base. Returns `None` when there is none,
    /// so the caller can fall through to the vector pipeline.
    pub async fn ask_knowledge_base(
        &self,
        question: &str,
        prompt: Option<&str>,
        context: Option<&str>,
    ) -> Result<Option<Answer>> {
        let Some(chunks) = self.knowledge_chunks().await? else {
            return Ok(None);
        };

        let relevant = self.scorer.score(question, &chunks);
        tracing::debug!(
            "Knowledge base: {} of {} chunks relevant",
            relevant.len(),
            chunks.len()
        );

        if relevant.is_empty() {
            return Ok(Some(self.plain_answer(question, GENERIC_APOLOGY, context)));
        }

        let answer = match self.answer_mode {
            AnswerMode::RuleBased => {
                let text = rule_based_answer(question, &relevant);
                Answer {
                    chunks: relevant,
                    ..self.plain_answer(question, &text, context)
                }
            }
            AnswerMode::Completion => {
                self.composer
                    .answer(question, &relevant, prompt, context)
                    .await
            }
        };
        Ok(Some(answer))
    }

    /// Answer from the vector index, keyword re-ranking the retrieved chunks
    pub async fn ask_index(
        &self,
        question: &str,
        prompt: Option<&str>,
        context: Option<&str>,
    ) -> Result<Answer> {
        let retrieved = self.vector_store.retrieve_relevant_chunks(question).await?;
        if retrieved.is_empty() {
            return Ok(self.plain_answer(question, NO_DOCUMENTS, context));
        }

        let relevant = self.scorer.score(question, &retrieved);
        Ok(self
            .composer
            .answer(question, &relevant, prompt, context)
            .await)
    }

    /// Plain vector-retrieval chat: retrieved chunks straight to the composer
    pub async fn chat(&self, query: &str) -> Result<Answer> {
        let retrieved = self.vector_store.retrieve_relevant_chunks(query).await?;
        if retrieved.is_empty() {
            return Ok(self.plain_answer(query, NO_RELEVANT_CHUNKS, None));
        }
        Ok(self.composer.answer(query, &retrieved, None, None).await)
    }

    fn plain_answer(&self, question: &str, text: &str, context: Option<&str>) -> Answer {
        Answer {
            answer: text.to_string(),
            chunks: Vec::new(),
            question: question.to_string(),
            context: context
                .filter(|c| !c.trim().is_empty())
                .unwrap_or("general")
                .to_string(),
        }
    }
}
