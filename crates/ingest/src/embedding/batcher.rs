use std::sync::Arc;

use super::traits::{Embedder, EmbeddingError};

/// Embeds arbitrarily long input lists in fixed-size requests.
pub struct EmbeddingBatcher {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl EmbeddingBatcher {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed every text, one request per batch, preserving input order.
    /// The first failing batch aborts the whole run.
    pub async fn embed_all(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            let embeddings = self.embedder.embed_batch(batch).await?;
            if embeddings.len() != batch.len() {
                return Err(EmbeddingError::CountMismatch {
                    sent: batch.len(),
                    received: embeddings.len(),
                });
            }
            tracing::debug!(batch = i, size = batch.len(), "Embedded batch");
            out.extend(embeddings);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Encodes each text's length so ordering is observable.
    struct FakeEmbedder {
        call_count: AtomicUsize,
        fail_on_call: Option<usize>,
    }

    impl FakeEmbedder {
        fn new() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
                fail_on_call: None,
            }
        }
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let call = self.call_count.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_call == Some(call) {
                return Err(EmbeddingError::Api("503: overloaded".into()));
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn splits_into_batches_and_keeps_order() {
        let embedder = Arc::new(FakeEmbedder::new());
        let batcher = EmbeddingBatcher::new(embedder.clone(), 3);

        let texts = ["a", "bb", "ccc", "dddd", "eeeee", "ffffff", "g"];
        let vectors = batcher.embed_all(&texts).await.unwrap();

        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 3);
        let firsts: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(firsts, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 1.0]);
    }

    #[tokio::test]
    async fn empty_input_is_noop() {
        let embedder = Arc::new(FakeEmbedder::new());
        let batcher = EmbeddingBatcher::new(embedder.clone(), 10);

        let result = batcher.embed_all(&[]).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failing_batch_aborts() {
        let embedder = Arc::new(FakeEmbedder {
            call_count: AtomicUsize::new(0),
            fail_on_call: Some(1),
        });
        let batcher = EmbeddingBatcher::new(embedder.clone(), 2);

        let err = batcher.embed_all(&["a", "b", "c", "d", "e"]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Api(_)));
        assert_eq!(embedder.call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let batcher = EmbeddingBatcher::new(Arc::new(FakeEmbedder::new()), 0);
        assert_eq!(batcher.batch_size, 1);
    }
}
