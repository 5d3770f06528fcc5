use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

// ── Errors ─────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("dimension mismatch in collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },
}

// ── Types ──────────────────────────────────────────

/// A chunk with its embedding, ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkInsert {
    /// Filename the chunk was cut from.
    pub source: String,
    pub page_number: usize,
    pub chunk_index: usize,
    pub start_index: usize,
    pub content: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub id: Uuid,
    pub source: String,
    pub page_number: usize,
    pub chunk_index: usize,
    pub start_index: usize,
    pub content: String,
    /// Cosine similarity, higher is closer.
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub source: String,
    pub chunk_count: usize,
}

// ── Trait ──────────────────────────────────────────

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// Append chunks to `collection`, creating it on first use.
    /// Returns the number of rows written.
    async fn upsert(&self, collection: &str, chunks: Vec<ChunkInsert>) -> Result<usize, StoreError>;

    /// The `k` chunks most similar to `embedding`, best first.
    /// Unknown collections and `k == 0` give an empty result.
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>, StoreError>;

    /// Ingested source files with their chunk counts, oldest first.
    async fn documents(&self, collection: &str) -> Result<Vec<DocumentSummary>, StoreError>;
}

/// All embeddings in a batch must share one width; returns it.
pub(crate) fn batch_dimensions(
    collection: &str,
    chunks: &[ChunkInsert],
) -> Result<Option<usize>, StoreError> {
    let Some(first) = chunks.first() else {
        return Ok(None);
    };
    let expected = first.embedding.len();
    if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != expected) {
        return Err(StoreError::DimensionMismatch {
            collection: collection.to_string(),
            expected,
            actual: bad.embedding.len(),
        });
    }
    Ok(Some(expected))
}
