//! Vector storage for embedded chunks.
//!
//! [`VectorStore`] is the seam the RAG pipeline talks to. Two backends exist:
//! [`PgVectorStore`] (PostgreSQL + pgvector, persistent) and
//! [`MemoryVectorStore`] (process-local, for development and tests).

pub mod memory;
pub mod postgres;
mod traits;

pub use memory::MemoryVectorStore;
pub use postgres::PgVectorStore;
pub use traits::{ChunkInsert, DocumentSummary, SearchResult, StoreError, VectorStore};
