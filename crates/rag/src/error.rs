use pdfrag_ingest::document::ExtractionError;
use pdfrag_ingest::embedding::EmbeddingError;
use pdfrag_llm::LlmError;
use pdfrag_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagError {
    /// Something the operator has to set up (LLM provider, API key, ...).
    #[error("configuration missing: {0}")]
    Config(String),

    #[error(transparent)]
    Ingestion(#[from] IngestError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Only PDF files allowed (got '{0}')")]
    NotPdf(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("no extractable text in '{0}'")]
    NoText(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("question must not be empty")]
    EmptyQuestion,

    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store failed: {0}")]
    Store(#[from] StoreError),

    #[error("LLM request failed: {0}")]
    Llm(#[from] LlmError),
}
