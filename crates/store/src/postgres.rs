//! PostgreSQL + pgvector backend.
//!
//! Collections are rows in `rag_collections`; each pins the embedding width
//! on first insert. Chunks live in `rag_chunks`. Similarity is
//! `1 - (embedding <=> query)` (cosine).

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::traits::{
    batch_dimensions, ChunkInsert, DocumentSummary, SearchResult, StoreError, VectorStore,
};

pub struct PgVectorStore {
    pool: PgPool,
}

impl PgVectorStore {
    /// Connect and apply the embedded migrations.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!("PostgreSQL connected");

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("Database migrations applied successfully");
        Ok(())
    }

    /// Id and pinned width of a collection, if it exists.
    async fn lookup_collection(&self, name: &str) -> Result<Option<(Uuid, usize)>, StoreError> {
        let row = sqlx::query("SELECT id, dimensions FROM rag_collections WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| (r.get("id"), r.get::<i32, _>("dimensions") as usize)))
    }
}

/// Create the collection if needed and check the batch width against it.
async fn ensure_collection(
    conn: &mut PgConnection,
    name: &str,
    dimensions: usize,
) -> Result<Uuid, StoreError> {
    sqlx::query(
        "INSERT INTO rag_collections (id, name, dimensions) VALUES ($1, $2, $3) \
         ON CONFLICT (name) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(dimensions as i32)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query("SELECT id, dimensions FROM rag_collections WHERE name = $1")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    let expected = row.get::<i32, _>("dimensions") as usize;
    if expected != dimensions {
        return Err(StoreError::DimensionMismatch {
            collection: name.to_string(),
            expected,
            actual: dimensions,
        });
    }
    Ok(row.get("id"))
}

#[async_trait]
impl VectorStore for PgVectorStore {
    fn backend(&self) -> &'static str {
        "pgvector"
    }

    async fn upsert(&self, collection: &str, chunks: Vec<ChunkInsert>) -> Result<usize, StoreError> {
        let Some(dimensions) = batch_dimensions(collection, &chunks)? else {
            return Ok(0);
        };

        let mut tx = self.pool.begin().await?;
        let collection_id = ensure_collection(&mut tx, collection, dimensions).await?;

        let count = chunks.len();
        for chunk in chunks {
            let embedding = Vector::from(chunk.embedding);
            sqlx::query(
                "INSERT INTO rag_chunks \
                 (id, collection_id, source, page_number, chunk_index, start_index, content, embedding) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(Uuid::new_v4())
            .bind(collection_id)
            .bind(&chunk.source)
            .bind(chunk.page_number as i32)
            .bind(chunk.chunk_index as i32)
            .bind(chunk.start_index as i32)
            .bind(&chunk.content)
            .bind(&embedding)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!(collection, count, "upserted chunks to pgvector");
        Ok(count)
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchResult>, StoreError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let Some((collection_id, dimensions)) = self.lookup_collection(collection).await? else {
            return Ok(Vec::new());
        };
        if dimensions != embedding.len() {
            return Err(StoreError::DimensionMismatch {
                collection: collection.to_string(),
                expected: dimensions,
                actual: embedding.len(),
            });
        }

        let embedding = Vector::from(embedding.to_vec());
        let rows = sqlx::query(
            "SELECT id, source, page_number, chunk_index, start_index, content, \
             1.0 - (embedding <=> $1::vector) AS similarity \
             FROM rag_chunks \
             WHERE collection_id = $2 \
             ORDER BY embedding <=> $1::vector \
             LIMIT $3",
        )
        .bind(&embedding)
        .bind(collection_id)
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await?;

        let results = rows
            .iter()
            .map(|row| SearchResult {
                id: row.get("id"),
                source: row.get("source"),
                page_number: row.get::<i32, _>("page_number") as usize,
                chunk_index: row.get::<i32, _>("chunk_index") as usize,
                start_index: row.get::<i32, _>("start_index") as usize,
                content: row.get("content"),
                score: row.get::<f64, _>("similarity") as f32,
            })
            .collect();
        Ok(results)
    }

    async fn documents(&self, collection: &str) -> Result<Vec<DocumentSummary>, StoreError> {
        let rows = sqlx::query(
            "SELECT c.source, COUNT(*) AS chunk_count \
             FROM rag_chunks c \
             JOIN rag_collections col ON col.id = c.collection_id \
             WHERE col.name = $1 \
             GROUP BY c.source \
             ORDER BY MIN(c.created_at)",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| DocumentSummary {
                source: row.get("source"),
                chunk_count: row.get::<i64, _>("chunk_count") as usize,
            })
            .collect())
    }
}
