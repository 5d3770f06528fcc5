use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::traits::{validate_embeddings, Embedder, EmbeddingError};

/// Embedder backed by a HuggingFace text-embeddings-inference server.
///
/// TEI serves exactly one model, so `model` is informational only.
pub struct TeiEmbedder {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl TeiEmbedder {
    pub fn new(url: String, model: String, dimensions: usize) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            url: url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        }
    }
}

#[derive(Serialize)]
struct TeiEmbedRequest<'a> {
    inputs: &'a [&'a str],
    truncate: bool,
}

#[async_trait]
impl Embedder for TeiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = TeiEmbedRequest {
            inputs: texts,
            truncate: true,
        };

        let response = self
            .client
            .post(format!("{}/embed", self.url))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(format!("{status}: {body}")));
        }

        let embeddings: Vec<Vec<f32>> = response.json().await?;
        validate_embeddings(&embeddings, texts.len(), self.dimensions)?;

        tracing::debug!(count = texts.len(), model = %self.model, "TEI batch embedded");
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
