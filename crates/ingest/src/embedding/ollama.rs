use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::{validate_embeddings, Embedder, EmbeddingError};

/// Embedder backed by a local Ollama instance.
pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn new(url: String, model: String, dimensions: usize) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        }
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = OllamaEmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{status}: {body}")));
        }

        let parsed: OllamaEmbedResponse = response.json().await?;
        validate_embeddings(&parsed.embeddings, texts.len(), self.dimensions)?;

        tracing::debug!(count = texts.len(), model = %self.model, "Ollama batch embedded");
        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_model_and_inputs() {
        let texts = ["a", "b"];
        let body = serde_json::to_value(OllamaEmbedRequest {
            model: "nomic-embed-text",
            input: &texts,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "model": "nomic-embed-text", "input": ["a", "b"] })
        );
    }

    #[test]
    fn response_parses_embeddings_field() {
        let parsed: OllamaEmbedResponse =
            serde_json::from_str(r#"{"model":"m","embeddings":[[0.1,0.2],[0.3,0.4]]}"#).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
        assert!(validate_embeddings(&parsed.embeddings, 2, 2).is_ok());
    }
}
