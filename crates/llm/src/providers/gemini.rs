use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::{LlmError, LlmProvider, Message, Role};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini via the `generateContent` REST endpoint.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

// ── Wire types ──────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    /// System messages go to `systemInstruction`; assistant turns are sent as `model`.
    fn build_request<'a>(
        messages: &'a [Message],
        temperature: f32,
        max_tokens: u32,
    ) -> GenerateRequest<'a> {
        let mut system_instruction = None;
        let mut contents = Vec::with_capacity(messages.len());
        for m in messages {
            let part = [Part { text: &m.content }];
            match m.role {
                Role::System if system_instruction.is_none() => {
                    system_instruction = Some(Content { role: None, parts: part });
                }
                Role::System => {}
                Role::User => contents.push(Content { role: Some("user"), parts: part }),
                Role::Assistant => contents.push(Content { role: Some("model"), parts: part }),
            }
        }

        GenerateRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/models/{}:generateContent", API_BASE, self.model);
        let body = Self::build_request(&messages, temperature, max_tokens);

        debug!(model = %self.model, "Gemini generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, body });
        }

        let resp: GenerateResponse = response.json().await?;
        first_candidate_text(resp)
    }
}

/// Concatenated text parts of the first candidate. A blocked prompt comes
/// back without candidates and is reported as a parse error.
fn first_candidate_text(resp: GenerateResponse) -> Result<String, LlmError> {
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(LlmError::ParseError("no text in candidates[0]".into()));
    }
    Ok(text)
}
