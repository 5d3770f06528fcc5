//! OpenAPI documentation aggregator, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "pdfrag API",
        version = "0.1.0",
        description = "Upload PDFs and ask questions answered from their content.",
    ),
    tags(
        (name = "Health", description = "Server readiness"),
        (name = "Documents", description = "PDF upload and listing"),
        (name = "Query", description = "Retrieval-augmented question answering"),
    ),
    paths(
        crate::api::health::health,
        crate::api::upload::upload,
        crate::api::query::query,
        crate::api::documents::documents,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::health::HealthResponse,
        crate::api::upload::UploadResponse,
        crate::api::query::QuestionForm,
        crate::api::query::QueryResponse,
        crate::api::documents::DocumentListResponse,
    ))
)]
pub struct ApiDoc;
