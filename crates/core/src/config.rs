use std::collections::HashMap;
use std::env;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Variable lookup with profile support: `{PROFILE}_{KEY}` wins over `{KEY}`.
struct Vars<'a> {
    profile: &'a str,
    map: &'a HashMap<String, String>,
}

impl Vars<'_> {
    fn opt(&self, key: &str) -> Option<String> {
        if !self.profile.is_empty() {
            let prefixed = format!("{}_{}", self.profile, key);
            if let Some(v) = self.map.get(&prefixed).filter(|v| !v.is_empty()) {
                return Some(v.clone());
            }
        }
        self.map.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.opt(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::invalid(key, &raw, e.to_string())),
            None => Ok(default),
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub rag: RagConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `RAG_PROFILE`. When set (e.g. `PROD`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Build config from an explicit variable map.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let profile = vars
            .get("RAG_PROFILE")
            .map(|p| p.trim().to_uppercase())
            .unwrap_or_default();
        let v = Vars {
            profile: &profile,
            map: vars,
        };
        let config = Self {
            server: ServerConfig::from_vars(&v)?,
            store: StoreConfig::from_vars(&v)?,
            embedding: EmbeddingConfig::from_vars(&v)?,
            llm: LlmConfig::from_vars(&v)?,
            rag: RagConfig::from_vars(&v)?,
            profile,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field invariants that parsing alone cannot enforce.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_size == 0 {
            return Err(ConfigError::invalid("CHUNK_SIZE", 0, "must be at least 1"));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::invalid(
                "CHUNK_OVERLAP",
                self.rag.chunk_overlap,
                format!("must be smaller than CHUNK_SIZE ({})", self.rag.chunk_size),
            ));
        }
        if self.rag.top_k == 0 {
            return Err(ConfigError::invalid("TOP_K", 0, "must be at least 1"));
        }
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::invalid("EMBEDDING_DIMENSIONS", 0, "must be at least 1"));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::invalid("EMBEDDING_BATCH_SIZE", 0, "must be at least 1"));
        }
        if self.store.backend == StoreBackend::PgVector && self.store.database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL".into()));
        }
        if self.embedding.provider == EmbeddingProvider::OpenAi && self.embedding.api_key.is_none() {
            return Err(ConfigError::Missing("EMBEDDING_API_KEY".into()));
        }
        Ok(())
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() {
            "default"
        } else {
            &self.profile
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  store:       backend={}, collection={}",
            self.store.backend,
            self.store.collection
        );
        tracing::info!(
            "  embedding:   provider={}, model={}, dims={}",
            self.embedding.provider,
            self.embedding.model,
            self.embedding.dimensions
        );
        match self.llm.resolve_provider() {
            Ok(p) => tracing::info!("  llm:         provider={}", p),
            Err(e) => tracing::info!("  llm:         (none: {})", e),
        }
        tracing::info!(
            "  rag:         chunk_size={}, overlap={}, top_k={}",
            self.rag.chunk_size,
            self.rag.chunk_overlap,
            self.rag.top_k
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    pub max_upload_mb: usize,
}

impl ServerConfig {
    fn from_vars(v: &Vars) -> Result<Self, ConfigError> {
        Ok(Self {
            host: v.or("HOST", "0.0.0.0"),
            port: v.parse("PORT", 8000)?,
            cors_origin: v.or("CORS_ORIGIN", "*"),
            max_upload_mb: v.parse("MAX_UPLOAD_MB", 50)?,
        })
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

// ── Vector store ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    PgVector,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pgvector" | "postgres" => Ok(StoreBackend::PgVector),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown vector store '{other}' (expected pgvector or memory)")),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::PgVector => write!(f, "pgvector"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub collection: String,
}

impl StoreConfig {
    fn from_vars(v: &Vars) -> Result<Self, ConfigError> {
        Ok(Self {
            backend: v.parse("VECTOR_STORE", StoreBackend::PgVector)?,
            database_url: v.opt("DATABASE_URL"),
            max_connections: v.parse("PG_MAX_CONNECTIONS", 5)?,
            collection: v.or("COLLECTION_NAME", "pdf_rag"),
        })
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// HuggingFace text-embeddings-inference.
    Tei,
    Ollama,
    OpenAi,
}

impl EmbeddingProvider {
    fn default_url(self) -> &'static str {
        match self {
            EmbeddingProvider::Tei => "http://localhost:8080",
            EmbeddingProvider::Ollama => "http://localhost:11434",
            EmbeddingProvider::OpenAi => "https://api.openai.com",
        }
    }
}

impl FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tei" | "huggingface" => Ok(EmbeddingProvider::Tei),
            "ollama" => Ok(EmbeddingProvider::Ollama),
            "openai" => Ok(EmbeddingProvider::OpenAi),
            other => Err(format!("unknown embedding provider '{other}' (expected tei, ollama or openai)")),
        }
    }
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingProvider::Tei => write!(f, "tei"),
            EmbeddingProvider::Ollama => write!(f, "ollama"),
            EmbeddingProvider::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub dimensions: usize,
    pub batch_size: usize,
    /// LRU capacity for query embeddings; 0 disables the cache.
    pub cache_size: usize,
}

impl EmbeddingConfig {
    fn from_vars(v: &Vars) -> Result<Self, ConfigError> {
        let provider = v.parse("EMBEDDING_PROVIDER", EmbeddingProvider::Tei)?;
        Ok(Self {
            url: v.or("EMBEDDING_URL", provider.default_url()),
            model: v.or("EMBEDDING_MODEL", "intfloat/e5-base-v2"),
            api_key: v.opt("EMBEDDING_API_KEY").or_else(|| v.opt("OPENAI_API_KEY")),
            dimensions: v.parse("EMBEDDING_DIMENSIONS", 768)?,
            batch_size: v.parse("EMBEDDING_BATCH_SIZE", 64)?,
            cache_size: v.parse("EMBEDDING_CACHE_SIZE", 1024)?,
            provider,
        })
    }
}

// ── LLM ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    Groq,
    Gemini,
    OpenAi,
    Ollama,
}

impl FromStr for LlmProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(LlmProviderKind::Groq),
            "gemini" | "google" => Ok(LlmProviderKind::Gemini),
            "openai" => Ok(LlmProviderKind::OpenAi),
            "ollama" => Ok(LlmProviderKind::Ollama),
            other => Err(format!("unknown LLM provider '{other}'")),
        }
    }
}

impl fmt::Display for LlmProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProviderKind::Groq => write!(f, "groq"),
            LlmProviderKind::Gemini => write!(f, "gemini"),
            LlmProviderKind::OpenAi => write!(f, "openai"),
            LlmProviderKind::Ollama => write!(f, "ollama"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Explicit provider; `None` means pick from whichever key is present.
    pub provider: Option<LlmProviderKind>,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    fn from_vars(v: &Vars) -> Result<Self, ConfigError> {
        let provider = match v.opt("LLM_PROVIDER") {
            Some(raw) => Some(
                raw.parse::<LlmProviderKind>()
                    .map_err(|e| ConfigError::invalid("LLM_PROVIDER", &raw, e))?,
            ),
            None => None,
        };
        Ok(Self {
            provider,
            groq_api_key: v.opt("GROQ_API_KEY"),
            groq_model: v.or("GROQ_MODEL", "llama-3.3-70b-versatile"),
            gemini_api_key: v.opt("GEMINI_API_KEY"),
            gemini_model: v.or("GEMINI_MODEL", "gemini-2.5-flash-lite"),
            openai_api_key: v.opt("OPENAI_API_KEY"),
            openai_model: v.or("OPENAI_MODEL", "gpt-4o-mini"),
            openai_base_url: v.or("OPENAI_BASE_URL", "https://api.openai.com"),
            ollama_url: v.or("OLLAMA_URL", "http://localhost:11434"),
            ollama_model: v.or("OLLAMA_MODEL", "llama3.2"),
            temperature: v.parse("LLM_TEMPERATURE", 0.0)?,
            max_tokens: v.parse("LLM_MAX_TOKENS", 1024)?,
        })
    }

    /// The provider to use: the explicit one, else Groq, else Gemini.
    pub fn resolve_provider(&self) -> Result<LlmProviderKind, ConfigError> {
        if let Some(p) = self.provider {
            return Ok(p);
        }
        if self.groq_api_key.is_some() {
            Ok(LlmProviderKind::Groq)
        } else if self.gemini_api_key.is_some() {
            Ok(LlmProviderKind::Gemini)
        } else {
            Err(ConfigError::Missing(
                "LLM credentials (GROQ_API_KEY, GEMINI_API_KEY or LLM_PROVIDER)".into(),
            ))
        }
    }
}

// ── RAG ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared by neighbouring chunks.
    pub chunk_overlap: usize,
    /// Chunks retrieved per question.
    pub top_k: usize,
}

impl RagConfig {
    fn from_vars(v: &Vars) -> Result<Self, ConfigError> {
        Ok(Self {
            chunk_size: v.parse("CHUNK_SIZE", 1000)?,
            chunk_overlap: v.parse("CHUNK_OVERLAP", 200)?,
            top_k: v.parse("TOP_K", 6)?,
        })
    }
}
