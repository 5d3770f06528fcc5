//! Application configuration builders.
//!
//! Constructs the embedder, vector store, LLM provider and RAG pipeline from `Config`.

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use pdfrag_core::config::{EmbeddingProvider, StoreBackend};
use pdfrag_core::Config;
use pdfrag_ingest::embedding::{
    CachedEmbedder, Embedder, OllamaEmbedder, OpenAiEmbedder, TeiEmbedder,
};
use pdfrag_llm::{LlmError, LlmProvider};
use pdfrag_rag::{RagPipeline, RagSettings};
use pdfrag_store::{MemoryVectorStore, PgVectorStore, VectorStore};

/// Load configuration from `.env` and environment variables.
pub fn load_config() -> anyhow::Result<Config> {
    pdfrag_core::config::load_dotenv();
    Config::from_env().context("invalid configuration")
}

/// Build the embedding backend, wrapped in an LRU cache unless disabled.
pub fn build_embedder(config: &Config) -> anyhow::Result<Arc<dyn Embedder>> {
    let emb = &config.embedding;
    let backend: Arc<dyn Embedder> = match emb.provider {
        EmbeddingProvider::Tei => {
            Arc::new(TeiEmbedder::new(emb.url.clone(), emb.model.clone(), emb.dimensions))
        }
        EmbeddingProvider::Ollama => {
            Arc::new(OllamaEmbedder::new(emb.url.clone(), emb.model.clone(), emb.dimensions))
        }
        EmbeddingProvider::OpenAi => {
            let api_key = emb
                .api_key
                .clone()
                .context("EMBEDDING_API_KEY is required for openai embeddings")?;
            Arc::new(OpenAiEmbedder::new(
                api_key,
                emb.model.clone(),
                Some(emb.url.clone()),
                emb.dimensions,
            ))
        }
    };
    info!(
        "Embedder ready (provider: {}, model: {}, dims: {})",
        emb.provider, emb.model, emb.dimensions
    );

    if emb.cache_size == 0 {
        return Ok(backend);
    }
    Ok(Arc::new(CachedEmbedder::new(backend, emb.cache_size)))
}

/// Connect the configured vector store. Database problems abort startup.
pub async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn VectorStore>> {
    match config.store.backend {
        StoreBackend::PgVector => {
            let url = config
                .store
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the pgvector store")?;
            let store = PgVectorStore::connect(url, config.store.max_connections)
                .await
                .context("failed to initialise pgvector store")?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            warn!("Using in-memory vector store; ingested documents are lost on restart");
            Ok(Arc::new(MemoryVectorStore::new()))
        }
    }
}

/// Build the LLM provider. Returns None if no provider is configured;
/// the server still starts and `/query` answers 503.
pub fn build_llm(config: &Config) -> Option<Arc<dyn LlmProvider>> {
    match pdfrag_llm::create_provider(&config.llm) {
        Ok(provider) => Some(Arc::from(provider)),
        Err(LlmError::NotConfigured(reason)) => {
            warn!("LLM not available: {}; POST /query will be disabled", reason);
            None
        }
        Err(e) => {
            warn!("Failed to create LLM provider: {}; POST /query will be disabled", e);
            None
        }
    }
}

pub async fn build_pipeline(config: &Config) -> anyhow::Result<RagPipeline> {
    let embedder = build_embedder(config)?;
    let store = build_store(config).await?;
    let llm = build_llm(config);
    Ok(RagPipeline::new(
        embedder,
        store,
        llm,
        RagSettings::from_config(config),
    ))
}
