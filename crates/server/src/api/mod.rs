//! HTTP endpoints.
//!
//! Shared error shape and the `RagError` → status mapping live here.

pub mod doc;
mod documents;
mod health;
mod query;
mod upload;


use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use pdfrag_ingest::document::ExtractionError;
use pdfrag_rag::{IngestError, QueryError, RagError};

// ── Shared types ─────────────────────────────────────────────────

/// Body of every failed request.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub(crate) fn status_for(err: &RagError) -> StatusCode {
    match err {
        RagError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        RagError::Ingestion(e) => match e {
            IngestError::NotPdf(_) | IngestError::Extraction(ExtractionError::UnsupportedType(_)) => {
                StatusCode::BAD_REQUEST
            }
            IngestError::Extraction(ExtractionError::PdfError(_)) | IngestError::NoText(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            IngestError::Embedding(_) | IngestError::Store(_) => StatusCode::BAD_GATEWAY,
        },
        RagError::Query(e) => match e {
            QueryError::EmptyQuestion => StatusCode::BAD_REQUEST,
            QueryError::Embedding(_) | QueryError::Store(_) | QueryError::Llm(_) => {
                StatusCode::BAD_GATEWAY
            }
        },
    }
}

/// Log a pipeline failure and turn it into a JSON error response.
pub(crate) fn rag_error(err: RagError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), "{}", err);
    } else {
        tracing::warn!(status = status.as_u16(), "{}", err);
    }
    api_error(status, err.to_string())
}

// ── Re-exports ───────────────────────────────────────────────────

pub use documents::documents;
pub use health::health;
pub use query::query;
pub use upload::upload;
