//! Router tests with in-process providers

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use faq_rag::config::RagConfig;
use faq_rag::generation::fallback::NO_RELEVANT_CHUNKS;
use faq_rag::providers::local::{LocalVectorStore, MemoryDocumentStore};
use faq_rag::providers::{CompletionProvider, EmbeddingProvider, IndexStats, VectorStoreProvider};
use faq_rag::server::{router, state::AppState};
use faq_rag::types::EmbeddedChunk;
use faq_rag::{Error, Result};

const BOUNDARY: &str = "faq-rag-test-boundary";

const FAQ: &str = "Nhà hàng Ngư Quán chuyên các món cá sông tươi ngon.\n\n\
    Hotline đặt bàn: 0382 699 866.\n\n\
    Giờ mở cửa: 10:00 - 22:00 hằng ngày.";

/// Bag-of-words vectors hashed into a small fixed dimension
struct HashEmbedder;

const DIM: usize = 16;

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; DIM];
                v[0] = 1.0;
                for word in text.to_lowercase().split_whitespace() {
                    let h = word
                        .bytes()
                        .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
                    v[h % DIM] += 1.0;
                }
                v
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "hash"
    }
}

#[derive(Default)]
struct CannedLlm {
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionProvider for CannedLlm {
    async fn complete(&self, _system: &str, _human: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Hotline đặt bàn: 0382 699 866".to_string())
    }

    fn name(&self) -> &str {
        "canned"
    }

    fn model(&self) -> &str {
        "canned"
    }
}

/// Vector store whose backend is unreachable
struct UnreachableStore;

#[async_trait]
impl VectorStoreProvider for UnreachableStore {
    async fn index_exists(&self) -> Result<bool> {
        Err(Error::storage("Describe index failed: HTTP 401 Unauthorized"))
    }

    async fn create_index(&self) -> Result<()> {
        Err(Error::storage("Create index failed: HTTP 401 Unauthorized"))
    }

    async fn describe_index_stats(&self) -> Result<IndexStats> {
        Err(Error::storage("Describe index stats failed: HTTP 401 Unauthorized"))
    }

    async fn store_embeddings(&self, _chunks: &[EmbeddedChunk]) -> Result<()> {
        Err(Error::storage("Upsert failed: HTTP 401 Unauthorized"))
    }

    async fn retrieve_relevant_chunks(&self, _query: &str) -> Result<Vec<String>> {
        Err(Error::storage("Query failed: HTTP 401 Unauthorized"))
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

struct Harness {
    app: Router,
    llm: Arc<CannedLlm>,
}

fn harness(knowledge_base: Option<PathBuf>) -> Harness {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(HashEmbedder);
    let store = Arc::new(LocalVectorStore::in_memory(embedder.clone(), 5));
    harness_with(knowledge_base, store)
}

fn harness_with(knowledge_base: Option<PathBuf>, store: Arc<dyn VectorStoreProvider>) -> Harness {
    let mut config = RagConfig::default();
    config.knowledge_base.path = knowledge_base;

    let llm = Arc::new(CannedLlm::default());
    let state = AppState::from_parts(
        config,
        Arc::new(MemoryDocumentStore::new()),
        store,
        Arc::new(HashEmbedder),
        llm.clone(),
    )
    .unwrap();

    Harness {
        app: router(state),
        llm,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn upload(uri: &str, field: &str, filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n{content}\r\n--{b}--\r\n",
        b = BOUNDARY,
    );
    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let h = harness(None);
    let (status, body) = send(&h.app, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["message"], "RAG API is running");
}

#[tokio::test]
async fn test_ask_requires_question() {
    let h = harness(None);
    let (status, body) = send(&h.app, post_json("/api/ask", json!({ "question": "  " }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Question"));
}

#[tokio::test]
async fn test_ask_answers_from_knowledge_base() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nguquan-info.txt");
    std::fs::write(&path, FAQ).unwrap();

    let h = harness(Some(path));
    let (status, body) = send(
        &h.app,
        post_json("/api/ask", json!({ "question": "Số điện thoại là gì?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Hotline đặt bàn: 0382 699 866");
    assert_eq!(body["question"], "Số điện thoại là gì?");
    assert_eq!(body["context"], "general");
    assert!(!body["chunks"].as_array().unwrap().is_empty());
    assert_eq!(h.llm.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chat_without_documents() {
    let h = harness(None);
    let (status, body) = send(&h.app, post_json("/api/chat", json!({ "query": "Giá?" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], NO_RELEVANT_CHUNKS);
    assert!(body["chunks"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_process_and_chat() {
    let h = harness(None);

    let (status, body) = send(
        &h.app,
        upload("/api/upload-txt", "txt", "nguquan-info.txt", FAQ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fileName"], "nguquan-info.txt");
    let path = body["filePath"].as_str().unwrap().to_string();

    let (status, body) = send(&h.app, get("/api/pdfs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"][0]["name"], "nguquan-info.txt");
    assert_eq!(body["storage"], "memory");

    let (status, body) = send(
        &h.app,
        post_json("/api/process-txt", json!({ "filePath": path })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "TXT processed successfully");
    let chunks = body["chunksCount"].as_u64().unwrap();
    assert!(chunks >= 1);
    assert_eq!(body["embeddingsCount"].as_u64().unwrap(), chunks);

    let (status, body) = send(&h.app, get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["initialized"], true);
    assert_eq!(body["indexExists"], true);
    assert_eq!(body["indexStats"]["totalVectorCount"].as_u64().unwrap(), chunks);

    let (status, body) = send(
        &h.app,
        post_json("/api/chat", json!({ "query": "Hotline đặt bàn là số nào?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Hotline đặt bàn: 0382 699 866");
    assert!(!body["chunks"].as_array().unwrap().is_empty());
    assert_eq!(h.llm.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_upload_rejects_wrong_extension() {
    let h = harness(None);
    let (status, body) = send(
        &h.app,
        upload("/api/upload-pdf", "pdf", "menu.docx", "not a pdf"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("menu.docx"));
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let h = harness(None);
    let (status, body) = send(&h.app, upload("/api/upload-pdf", "other", "menu.pdf", "%PDF")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing input: No PDF file uploaded");
}

#[tokio::test]
async fn test_process_rejects_mismatched_type() {
    let h = harness(None);
    let (status, _) = send(
        &h.app,
        post_json("/api/process-pdf", json!({ "pdfPath": "notes.txt" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&h.app, post_json("/api/process-pdf", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_process_missing_file_is_extraction_error() {
    let h = harness(None);
    let (status, body) = send(
        &h.app,
        post_json("/api/process-txt", json!({ "filePath": "absent.txt" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("absent.txt"));
}

#[tokio::test]
async fn test_status_reports_store_failure() {
    let h = harness_with(None, Arc::new(UnreachableStore));
    let (status, body) = send(&h.app, get("/api/status")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn test_ask_without_knowledge_base_uses_index() {
    let h = harness(None);

    let (status, body) = send(
        &h.app,
        upload("/api/upload-txt", "txt", "nguquan-info.txt", FAQ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let path = body["filePath"].as_str().unwrap().to_string();

    let (status, _) = send(
        &h.app,
        post_json("/api/process-txt", json!({ "filePath": path })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &h.app,
        post_json(
            "/api/ask",
            json!({ "question": "Số hotline là gì?", "context": "contact" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Hotline đặt bàn: 0382 699 866");
    assert_eq!(body["context"], "contact");
    let chunks = body["chunks"].as_array().unwrap();
    assert!(chunks
        .iter()
        .any(|c| c.as_str().unwrap().contains("0382 699 866")));
    assert_eq!(h.llm.calls.load(Ordering::SeqCst), 1);
}
