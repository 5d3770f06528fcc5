use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Count mismatch: sent {sent} texts, received {received} vectors")]
    CountMismatch { sent: usize, received: usize },
}

/// Trait for embedding backends (TEI, Ollama, OpenAI-compatible).
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input text (in order).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// The dimensionality of the output vectors.
    fn dimensions(&self) -> usize;

    /// Embed a single text, typically a user question.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text]).await?;
        if vectors.len() != 1 {
            return Err(EmbeddingError::CountMismatch {
                sent: 1,
                received: vectors.len(),
            });
        }
        Ok(vectors.swap_remove(0))
    }
}

/// Reject responses that do not carry one vector of the expected width per input.
pub(crate) fn validate_embeddings(
    embeddings: &[Vec<f32>],
    sent: usize,
    dimensions: usize,
) -> Result<(), EmbeddingError> {
    if embeddings.len() != sent {
        return Err(EmbeddingError::CountMismatch {
            sent,
            received: embeddings.len(),
        });
    }
    if let Some(bad) = embeddings.iter().find(|v| v.len() != dimensions) {
        return Err(EmbeddingError::DimensionMismatch {
            expected: dimensions,
            actual: bad.len(),
        });
    }
    Ok(())
}
