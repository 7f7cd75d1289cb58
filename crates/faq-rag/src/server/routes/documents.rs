//! Upload and listing endpoints for source files

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    response::{DocumentList, UploadResponse},
    FileType,
};

/// GET /api/pdfs - list uploaded files
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<DocumentList>> {
    let documents = state.documents().list_documents().await?;
    Ok(Json(DocumentList {
        documents,
        storage: state.documents().name().to_string(),
    }))
}

/// POST /api/upload-pdf - multipart field `pdf`
pub async fn upload_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    upload(&state, multipart, "pdf", FileType::Pdf).await
}

/// POST /api/upload-txt - multipart field `txt`
pub async fn upload_txt(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    upload(&state, multipart, "txt", FileType::Txt).await
}

async fn upload(
    state: &AppState,
    mut multipart: Multipart,
    field_name: &str,
    expected: FileType,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::MissingInput(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| Error::missing(format!("No {} file uploaded", expected.label())))?;

        if FileType::from_path(&filename) != expected {
            return Err(Error::UnsupportedFileType(format!(
                "Only {} files are allowed: {}",
                expected.label(),
                filename
            )));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::MissingInput(format!("Failed to read {}: {}", filename, e)))?;

        let path = state.documents().store_document(&filename, &data).await?;
        tracing::info!(
            "Stored {} ({} bytes) via {}",
            filename,
            data.len(),
            state.documents().name()
        );

        return Ok(Json(UploadResponse {
            message: format!("{} uploaded successfully", expected.label()),
            file_name: filename,
            file_path: path,
            size: data.len() as u64,
        }));
    }

    Err(Error::missing(format!("No {} file uploaded", expected.label())))
}
