//! Q&A server binary
//!
//! Run with: cargo run -p faq-rag --bin faq-rag-server
//! Set `RAG_CONFIG` to a TOML file to override the defaults.

use faq_rag::{config::RagConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faq_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var_os("RAG_CONFIG").map(PathBuf::from);
    let config = RagConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    if let Some(path) = &config_path {
        tracing::info!("  - Config file: {}", path.display());
    }
    tracing::info!("  - Storage: {:?}", config.storage.backend);
    tracing::info!("  - Vector store: {:?}", config.vector_db.backend);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!(
        "  - Chunking: {:?} {}/{}",
        config.chunking.strategy,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    if let Some(path) = &config.knowledge_base.path {
        tracing::info!(
            "  - Knowledge base: {} ({:?})",
            path.display(),
            config.knowledge_base.answer_mode
        );
    }
    if config.llm.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; embedding and completion calls will fail");
    }

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/api/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
