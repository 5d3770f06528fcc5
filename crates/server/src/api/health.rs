use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub collection: String,
    pub store: String,
    pub llm_configured: bool,
}

/// Server health and wiring summary
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Server is up", body = HealthResponse))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let pipeline = &state.pipeline;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        collection: pipeline.settings().collection.clone(),
        store: pipeline.store_backend().to_string(),
        llm_configured: pipeline.has_llm(),
    })
}
