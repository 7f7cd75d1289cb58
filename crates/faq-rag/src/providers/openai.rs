//! OpenAI-compatible API client for embeddings and chat completions with retry logic

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::CompletionProvider;
use super::retry_request;

/// OpenAI-compatible API client with automatic retry
pub struct OpenAiClient {
    /// HTTP client
    client: Client,
    embeddings: EmbeddingConfig,
    llm: LlmConfig,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a new client with retry support
    pub fn new(embeddings: &EmbeddingConfig, llm: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            embeddings: embeddings.clone(),
            llm: llm.clone(),
        })
    }

    fn authorize(request: RequestBuilder, api_key: &str) -> RequestBuilder {
        if api_key.is_empty() {
            request
        } else {
            request.bearer_auth(api_key)
        }
    }

    /// Only the text-embedding-3 family accepts a `dimensions` parameter
    fn requested_dimensions(&self) -> Option<usize> {
        self.embeddings
            .model
            .starts_with("text-embedding-3")
            .then_some(self.embeddings.dimensions)
    }
}

/// Restore input order and check one vector per input
fn ordered_vectors(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(Error::embedding(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.embeddings.base_url.trim_end_matches('/'));
        let timeout = Duration::from_secs(self.embeddings.timeout_secs);
        let dimensions = self.requested_dimensions();
        let url = url.as_str();
        let this = self;

        retry_request(self.embeddings.max_retries, "Embedding", || async move {
            let request = EmbedRequest {
                model: &this.embeddings.model,
                input: texts,
                dimensions,
            };

            let response = Self::authorize(this.client.post(url), &this.embeddings.api_key)
                .timeout(timeout)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::embedding(format!(
                    "Embedding failed: HTTP {} - {}",
                    status, body
                )));
            }

            let embed_response: EmbedResponse = response
                .json()
                .await
                .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

            ordered_vectors(embed_response.data, texts.len())
        })
        .await
    }

    fn dimensions(&self) -> usize {
        self.embeddings.dimensions
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn complete(&self, system: &str, human: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.llm.base_url.trim_end_matches('/'));
        let timeout = Duration::from_secs(self.llm.timeout_secs);

        tracing::info!("Generating answer with model: {}", self.llm.model);
        let url = url.as_str();
        let this = self;

        retry_request(self.llm.max_retries, "Completion", || async move {
            let request = ChatRequest {
                model: &this.llm.model,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: system,
                    },
                    ChatMessage {
                        role: "user",
                        content: human,
                    },
                ],
                temperature: this.llm.temperature,
            };

            let response = Self::authorize(this.client.post(url), &this.llm.api_key)
                .timeout(timeout)
                .json(&request)
                .send()
                .await
                .map_err(|e| Error::completion(format!("Completion request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::completion(format!(
                    "Completion failed: HTTP {} - {}",
                    status, body
                )));
            }

            let chat_response: ChatResponse = response
                .json()
                .await
                .map_err(|e| Error::completion(format!("Failed to parse completion response: {}", e)))?;

            chat_response
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| Error::completion("response contained no choices"))
        })
        .await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.llm.model
    }
}
