//! Pinecone vector store over the REST control and data planes

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};
use crate::types::{ChunkMetadata, EmbeddedChunk};

use super::embedding::EmbeddingProvider;
use super::retry_request;
use super::vector_store::{IndexStats, VectorStoreProvider};

const API_VERSION: &str = "2024-07";

/// Pinecone caps upsert requests; stay well under the 2 MB body limit
const UPSERT_BATCH: usize = 100;

/// Pinecone-backed vector store
pub struct PineconeVectorStore {
    client: Client,
    config: VectorDbConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    /// Data plane base URL, resolved once from the control plane
    host: OnceCell<String>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
}

#[derive(Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a ChunkMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    #[serde(default)]
    metadata: Option<MatchMetadata>,
}

#[derive(Deserialize)]
struct MatchMetadata {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    dimension: usize,
    #[serde(default)]
    total_vector_count: u64,
    #[serde(default)]
    index_fullness: f32,
}

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
}

impl PineconeVectorStore {
    pub fn new(config: &VectorDbConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::InvalidConfiguration(
                "vector_db.api_key is required for the pinecone backend".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("HTTP client: {}", e)))?;

        let host = match &config.index_host {
            Some(host) => OnceCell::new_with(Some(normalize_host(host))),
            None => OnceCell::new(),
        };

        Ok(Self {
            client,
            config: config.clone(),
            embedder,
            host,
        })
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.config.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    fn index_url(&self) -> String {
        format!(
            "{}/indexes/{}",
            self.config.control_url.trim_end_matches('/'),
            self.config.index_name
        )
    }

    /// Data plane base URL, looked up on first use
    async fn host(&self) -> Result<&str> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let response = self
                    .with_headers(self.client.get(self.index_url()))
                    .send()
                    .await
                    .map_err(|e| Error::storage(format!("Describe index failed: {}", e)))?;
                let description: IndexDescription = check(response, "Describe index")
                    .await?
                    .json()
                    .await
                    .map_err(|e| Error::storage(format!("Failed to parse index description: {}", e)))?;
                tracing::debug!("Pinecone index host: {}", description.host);
                Ok::<_, Error>(normalize_host(&description.host))
            })
            .await?;
        Ok(host.as_str())
    }

    async fn upsert_batch(&self, host: &str, batch: &[EmbeddedChunk]) -> Result<()> {
        let url = format!("{}/vectors/upsert", host);
        let body = UpsertRequest {
            vectors: batch
                .iter()
                .map(|c| PineconeVector {
                    id: &c.id,
                    values: &c.vector,
                    metadata: &c.metadata,
                })
                .collect(),
        };
        let body = &body;
        let url = url.as_str();

        retry_request(self.config.max_retries, "Upsert", || async move {
            let response = self
                .with_headers(self.client.post(url))
                .json(body)
                .send()
                .await
                .map_err(|e| Error::storage(format!("Upsert request failed: {}", e)))?;
            check(response, "Upsert").await?;
            Ok(())
        })
        .await
    }
}

/// Data plane hosts come back without a scheme
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

async fn check(response: Response, what: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(Error::storage(format!("{} failed: HTTP {} - {}", what, status, body)))
}

fn match_texts(response: QueryResponse) -> Vec<String> {
    response
        .matches
        .into_iter()
        .filter_map(|m| m.metadata.and_then(|md| md.text))
        .collect()
}

#[async_trait]
impl VectorStoreProvider for PineconeVectorStore {
    async fn index_exists(&self) -> Result<bool> {
        let response = self
            .with_headers(self.client.get(self.index_url()))
            .send()
            .await
            .map_err(|e| Error::storage(format!("Describe index failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response, "Describe index").await?;
        Ok(true)
    }

    async fn create_index(&self) -> Result<()> {
        let url = format!("{}/indexes", self.config.control_url.trim_end_matches('/'));
        let body = json!({
            "name": self.config.index_name,
            "dimension": self.embedder.dimensions(),
            "metric": "cosine",
            "spec": {
                "serverless": {
                    "cloud": self.config.cloud,
                    "region": self.config.region,
                }
            }
        });

        let response = self
            .with_headers(self.client.post(url))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::storage(format!("Create index failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            tracing::info!("Pinecone index '{}' already exists", self.config.index_name);
            return Ok(());
        }
        check(response, "Create index").await?;
        tracing::info!("Created Pinecone index '{}'", self.config.index_name);
        Ok(())
    }

    async fn describe_index_stats(&self) -> Result<IndexStats> {
        let url = format!("{}/describe_index_stats", self.host().await?);
        let response = self
            .with_headers(self.client.post(url))
            .json(&json!({}))
            .send()
            .await
            .map_err(|e| Error::storage(format!("Describe index stats failed: {}", e)))?;

        let stats: StatsResponse = check(response, "Describe index stats")
            .await?
            .json()
            .await
            .map_err(|e| Error::storage(format!("Failed to parse index stats: {}", e)))?;

        Ok(IndexStats {
            dimension: stats.dimension,
            total_vector_count: stats.total_vector_count,
            index_fullness: stats.index_fullness,
        })
    }

    async fn store_embeddings(&self, chunks: &[EmbeddedChunk]) -> Result<()> {
        let host = self.host().await?;
        for batch in chunks.chunks(UPSERT_BATCH) {
            self.upsert_batch(host, batch).await?;
        }
        tracing::info!("Upserted {} vectors to Pinecone", chunks.len());
        Ok(())
    }

    async fn retrieve_relevant_chunks(&self, query: &str) -> Result<Vec<String>> {
        let vector = self.embedder.embed(query).await?;
        let url = format!("{}/query", self.host().await?);
        let request = QueryRequest {
            vector: &vector,
            top_k: self.config.top_k,
            include_metadata: true,
        };

        let response = self
            .with_headers(self.client.post(url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::storage(format!("Query failed: {}", e)))?;

        let parsed: QueryResponse = check(response, "Query")
            .await?
            .json()
            .await
            .map_err(|e| Error::storage(format!("Failed to parse query response: {}", e)))?;

        Ok(match_texts(parsed))
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
