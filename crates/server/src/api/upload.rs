use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

use super::{api_error, rag_error, ApiError, ErrorResponse};

const SUCCESS_MESSAGE: &str = "PDF processed successfully! You can now ask questions.";

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub pages: usize,
    pub chunks: usize,
}

/// Upload a PDF for indexing
///
/// Accepts multipart/form-data with a `file` field. The PDF is parsed,
/// chunked, embedded and appended to the collection.
#[utoipa::path(
    post,
    path = "/upload",
    tag = "Documents",
    request_body(content_type = "multipart/form-data", description = "PDF in the `file` field"),
    responses(
        (status = 200, description = "PDF ingested", body = UploadResponse),
        (status = 400, description = "Not a PDF, missing file or malformed form", body = ErrorResponse),
        (status = 422, description = "PDF has no extractable text", body = ErrorResponse),
        (status = 502, description = "Embedding server or vector store failed", body = ErrorResponse),
        (status = 503, description = "Service not configured", body = ErrorResponse)
    )
)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(e.status(), format!("Multipart error: {}", e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| api_error(e.status(), format!("Failed to read file: {}", e.body_text())))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "No file provided (expected form field 'file')",
        )
    })?;
    info!(file = %filename, size = bytes.len(), "Upload received");

    let report = state
        .pipeline
        .ingest(&filename, &bytes)
        .await
        .map_err(rag_error)?;

    Ok(Json(UploadResponse {
        message: SUCCESS_MESSAGE.to_string(),
        filename: report.source,
        pages: report.pages,
        chunks: report.chunks,
    }))
}
