use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use pdfrag_store::DocumentSummary;

use crate::state::AppState;

use super::{rag_error, ApiError, ErrorResponse};

#[derive(Serialize, utoipa::ToSchema)]
pub struct DocumentListResponse {
    pub collection: String,
    #[schema(value_type = Vec<Object>)]
    pub documents: Vec<DocumentSummary>,
}

/// List ingested PDFs with their chunk counts
#[utoipa::path(
    get,
    path = "/documents",
    tag = "Documents",
    responses(
        (status = 200, description = "Documents in the collection", body = DocumentListResponse),
        (status = 502, description = "Vector store failed", body = ErrorResponse)
    )
)]
pub async fn documents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let documents = state.pipeline.documents().await.map_err(rag_error)?;
    Ok(Json(DocumentListResponse {
        collection: state.pipeline.settings().collection.clone(),
        documents,
    }))
}
