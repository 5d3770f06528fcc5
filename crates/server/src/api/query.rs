use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use pdfrag_rag::SourceRef;

use crate::state::AppState;

use super::{api_error, rag_error, ApiError, ErrorResponse};

// ── Request extraction ────────────────────────────

/// The `question` form field, sent either urlencoded or as multipart.
/// A missing field reads as an empty question.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct QuestionForm {
    #[serde(default)]
    pub question: String,
}

impl<S> FromRequest<S> for QuestionForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(form) = Form::<QuestionForm>::from_request(req, state)
                .await
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
            return Ok(form);
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.body_text()))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| api_error(e.status(), e.body_text()))?
        {
            if field.name() == Some("question") {
                let question = field
                    .text()
                    .await
                    .map_err(|e| api_error(e.status(), e.body_text()))?;
                return Ok(QuestionForm { question });
            }
        }
        Ok(QuestionForm::default())
    }
}

// ── Response ──────────────────────────────────────

#[derive(Serialize, utoipa::ToSchema)]
pub struct QueryResponse {
    pub answer: String,
    #[schema(value_type = Vec<Object>)]
    pub sources: Vec<SourceRef>,
}

/// Ask a question about the uploaded PDFs
///
/// Embeds the question, retrieves the most similar chunks and asks the LLM
/// to answer from that context only.
#[utoipa::path(
    post,
    path = "/query",
    tag = "Query",
    request_body(content = QuestionForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Answer generated", body = QueryResponse),
        (status = 400, description = "Empty question", body = ErrorResponse),
        (status = 502, description = "Embedding server, vector store or LLM failed", body = ErrorResponse),
        (status = 503, description = "No LLM provider configured", body = ErrorResponse)
    )
)]
pub async fn query(
    State(state): State<Arc<AppState>>,
    form: QuestionForm,
) -> Result<Json<QueryResponse>, ApiError> {
    let answer = state
        .pipeline
        .answer(&form.question)
        .await
        .map_err(rag_error)?;

    Ok(Json(QueryResponse {
        answer: answer.answer,
        sources: answer.sources,
    }))
}
