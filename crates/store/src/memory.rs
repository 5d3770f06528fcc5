//! In-memory vector store using cosine similarity.
//!
//! Collections live in a `HashMap` behind a `tokio::sync::RwLock`; nothing
//! survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::traits::{
    batch_dimensions, ChunkInsert, DocumentSummary, SearchResult, StoreError, VectorStore,
};

#[derive(Debug)]
struct MemoryCollection {
    dimensions: usize,
    rows: Vec<(Uuid, ChunkInsert)>,
}

#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn mismatch(collection: &str, expected: usize, actual: usize) -> StoreError {
    StoreError::DimensionMismatch {
        collection: collection.to_string(),
        expected,
        actual,
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, collection: &str, chunks: Vec<ChunkInsert>) -> Result<usize, StoreError> {
        let Some(dimensions) = batch_dimensions(collection, &chunks)? else {
            return Ok(0);
        };

        let mut collections = self.collections.write().await;
        let entry = collections
            .entry(collection.to_string())
            .or_insert_with(|| MemoryCollection {
                dimensions,
                rows: Vec::new(),
            });
        if entry.dimensions != dimensions {
            return Err(mismatch(collection, entry.dimensions, dimensions));
        }

        let count = chunks.len();
        entry
            .rows
            .extend(chunks.into_iter().map(|c| (Uuid::new_v4(), c)));
        tracing::debug!(collection, count, total = entry.rows.len(), "upserted chunks in memory");
        Ok(count)
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        let collections = self.collections.read().await;
        let Some(store) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }
        if store.dimensions != embedding.len() {
            return Err(mismatch(collection, store.dimensions, embedding.len()));
        }

        let mut scored: Vec<SearchResult> = store
            .rows
            .iter()
            .map(|(id, chunk)| SearchResult {
                id: *id,
                source: chunk.source.clone(),
                page_number: chunk.page_number,
                chunk_index: chunk.chunk_index,
                start_index: chunk.start_index,
                content: chunk.content.clone(),
                score: cosine_similarity(&chunk.embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn documents(&self, collection: &str) -> Result<Vec<DocumentSummary>, StoreError> {
        let collections = self.collections.read().await;
        let Some(store) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut summaries: Vec<DocumentSummary> = Vec::new();
        for (_, chunk) in &store.rows {
            match summaries.iter_mut().find(|s| s.source == chunk.source) {
                Some(summary) => summary.chunk_count += 1,
                None => summaries.push(DocumentSummary {
                    source: chunk.source.clone(),
                    chunk_count: 1,
                }),
            }
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str, index: usize, embedding: Vec<f32>) -> ChunkInsert {
        ChunkInsert {
            source: source.to_string(),
            page_number: 1,
            chunk_index: index,
            start_index: index * 800,
            content: format!("{source} chunk {index}"),
            embedding,
        }
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn query_orders_by_similarity_and_truncates() {
        let store = MemoryVectorStore::new();
        let written = store
            .upsert(
                "docs",
                vec![
                    chunk("a.pdf", 0, vec![0.0, 1.0]),
                    chunk("a.pdf", 1, vec![1.0, 0.0]),
                    chunk("a.pdf", 2, vec![1.0, 1.0]),
                ],
            )
            .await
            .unwrap();
        assert_eq!(written, 3);

        let results = store.query("docs", &[1.0, 0.1], 2).await.unwrap();
        let indices: Vec<usize> = results.iter().map(|r| r.chunk_index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn unknown_collection_and_zero_k_are_empty() {
        let store = MemoryVectorStore::new();
        assert!(store.query("missing", &[1.0], 6).await.unwrap().is_empty());
        assert!(store.documents("missing").await.unwrap().is_empty());

        store.upsert("docs", vec![chunk("a.pdf", 0, vec![1.0])]).await.unwrap();
        assert!(store.query("docs", &[1.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_upsert_does_not_create_collection() {
        let store = MemoryVectorStore::new();
        assert_eq!(store.upsert("docs", Vec::new()).await.unwrap(), 0);
        assert!(store.collections.read().await.is_empty());
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let store = MemoryVectorStore::new();
        store.upsert("docs", vec![chunk("a.pdf", 0, vec![1.0, 0.0])]).await.unwrap();

        let err = store
            .upsert("docs", vec![chunk("b.pdf", 0, vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { expected: 2, actual: 3, .. }));

        let err = store.query("docs", &[1.0], 3).await.unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { expected: 2, actual: 1, .. }));
    }

    #[tokio::test]
    async fn repeated_ingest_appends_and_documents_count_chunks() {
        let store = MemoryVectorStore::new();
        store
            .upsert("docs", vec![chunk("a.pdf", 0, vec![1.0]), chunk("a.pdf", 1, vec![1.0])])
            .await
            .unwrap();
        store.upsert("docs", vec![chunk("b.pdf", 0, vec![1.0])]).await.unwrap();
        store.upsert("docs", vec![chunk("a.pdf", 0, vec![1.0])]).await.unwrap();

        let docs = store.documents("docs").await.unwrap();
        assert_eq!(
            docs,
            vec![
                DocumentSummary { source: "a.pdf".into(), chunk_count: 3 },
                DocumentSummary { source: "b.pdf".into(), chunk_count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let store = MemoryVectorStore::new();
        store.upsert("one", vec![chunk("a.pdf", 0, vec![1.0, 0.0])]).await.unwrap();
        store.upsert("two", vec![chunk("b.pdf", 0, vec![1.0, 0.0, 0.0])]).await.unwrap();

        let results = store.query("one", &[1.0, 0.0], 6).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "a.pdf");
    }
}
