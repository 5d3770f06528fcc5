//! HTTP router construction.
//!
//! Assembles the Axum routes, middleware and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use pdfrag_core::config::ServerConfig;

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(
            "/upload",
            post(api::upload).layer(DefaultBodyLimit::max(server.max_upload_bytes())),
        )
        .route("/query", post(api::query))
        .route("/documents", get(api::documents))
        .layer(cors_layer(&server.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}

/// `*` allows any origin; anything else is a single allowed origin.
fn cors_layer(origin: &str) -> CorsLayer {
    if origin.trim() == "*" {
        return CorsLayer::permissive();
    }
    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!("Invalid CORS_ORIGIN '{}': {}; cross-origin requests disabled", origin, e);
            CorsLayer::new()
        }
    }
}
