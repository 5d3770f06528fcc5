pub mod batcher;
pub mod cache;
pub mod ollama;
pub mod openai;
pub mod tei;
pub mod traits;

pub use batcher::EmbeddingBatcher;
pub use cache::{CachedEmbedder, EmbeddingCache};
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use tei::TeiEmbedder;
pub use traits::{Embedder, EmbeddingError};
