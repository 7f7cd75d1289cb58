//! Processing endpoints: run an uploaded file through the ingestion pipeline

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    query::required, response::ProcessResponse, Document, FileType, ProcessRequest,
};

/// POST /api/process-pdf - `{ "pdfPath": ... }`
pub async fn process_pdf(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>> {
    process(&state, request, FileType::Pdf).await
}

/// POST /api/process-txt - `{ "filePath": ... }`
pub async fn process_txt(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>> {
    process(&state, request, FileType::Txt).await
}

async fn process(
    state: &AppState,
    request: ProcessRequest,
    expected: FileType,
) -> Result<Json<ProcessResponse>> {
    let path = required(
        request.path.as_deref(),
        &format!("{} path", expected.label()),
    )?;

    let document = Document::new(path);
    if document.file_type != expected {
        return Err(Error::UnsupportedFileType(format!(
            "Expected a {} file: {}",
            expected.label(),
            document.source
        )));
    }

    state.index().ensure().await?;

    let start = Instant::now();
    let report = state.pipeline().ingest(&document).await?;
    tracing::info!(
        "Processed {}: {} chunks, {} embeddings in {:.1}s",
        document.filename(),
        report.chunk_count,
        report.embedding_count,
        start.elapsed().as_secs_f64()
    );

    Ok(Json(ProcessResponse {
        message: format!("{} processed successfully", expected.label()),
        chunks_count: report.chunk_count,
        embeddings_count: report.embedding_count,
    }))
}
