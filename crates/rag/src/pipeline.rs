use std::sync::Arc;

use pdfrag_core::Config;
use pdfrag_ingest::document::chunker::{chunk_document, ChunkConfig};
use pdfrag_ingest::document::{self, is_pdf, ExtractedDocument, ExtractionError};
use pdfrag_ingest::embedding::{Embedder, EmbeddingBatcher};
use pdfrag_llm::{build_messages, LlmProvider};
use pdfrag_store::{ChunkInsert, DocumentSummary, SearchResult, VectorStore};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::error::{IngestError, QueryError, RagError};

// ── Settings ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RagSettings {
    pub collection: String,
    pub chunk: ChunkConfig,
    pub top_k: usize,
    pub batch_size: usize,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl RagSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            collection: config.store.collection.clone(),
            chunk: ChunkConfig {
                chunk_size: config.rag.chunk_size,
                chunk_overlap: config.rag.chunk_overlap,
            },
            top_k: config.rag.top_k,
            batch_size: config.embedding.batch_size,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
        }
    }
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            collection: "pdf_rag".to_string(),
            chunk: ChunkConfig::default(),
            top_k: 6,
            batch_size: 64,
            temperature: 0.0,
            max_tokens: 1024,
        }
    }
}

// ── Results ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub source: String,
    pub pages: usize,
    pub chunks: usize,
}

/// Where a retrieved passage came from.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRef {
    pub source: String,
    pub page_number: usize,
    pub chunk_index: usize,
    pub score: f32,
}

impl From<&SearchResult> for SourceRef {
    fn from(r: &SearchResult) -> Self {
        Self {
            source: r.source.clone(),
            page_number: r.page_number,
            chunk_index: r.chunk_index,
            score: r.score,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

// ── Pipeline ──────────────────────────────────────────

/// PDF parsing is CPU-bound and pdf-extract panics on some malformed
/// files, so it runs on the blocking pool and a panic becomes an
/// extraction error.
async fn extract_off_runtime(
    bytes: &[u8],
    filename: &str,
) -> Result<ExtractedDocument, IngestError> {
    let owned = bytes.to_vec();
    let name = filename.to_string();
    match tokio::task::spawn_blocking(move || document::extract_text(&owned, &name)).await {
        Ok(result) => Ok(result?),
        Err(join) if join.is_panic() => {
            error!(file = filename, "PDF parser panicked");
            Err(ExtractionError::PdfError("malformed PDF: parser aborted".to_string()).into())
        }
        Err(join) => Err(ExtractionError::PdfError(join.to_string()).into()),
    }
}

pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    batcher: EmbeddingBatcher,
    store: Arc<dyn VectorStore>,
    llm: Option<Arc<dyn LlmProvider>>,
    settings: RagSettings,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        llm: Option<Arc<dyn LlmProvider>>,
        settings: RagSettings,
    ) -> Self {
        Self {
            batcher: EmbeddingBatcher::new(embedder.clone(), settings.batch_size),
            embedder,
            store,
            llm,
            settings,
        }
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub fn store_backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Extract, chunk, embed and store one uploaded PDF.
    pub async fn ingest(&self, filename: &str, bytes: &[u8]) -> Result<IngestReport, RagError> {
        if !is_pdf(filename) {
            return Err(IngestError::NotPdf(filename.to_string()).into());
        }

        let doc = extract_off_runtime(bytes, filename).await?;
        if doc.is_empty() {
            return Err(IngestError::NoText(filename.to_string()).into());
        }
        info!(
            file = filename,
            pages = doc.pages.len(),
            chars = doc.total_chars(),
            "Extracted PDF text"
        );

        let chunks = chunk_document(&doc, &self.settings.chunk);
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self
            .batcher
            .embed_all(&texts)
            .await
            .map_err(IngestError::from)?;
        debug!(file = filename, chunks = chunks.len(), "Embedded chunks");

        let inserts: Vec<ChunkInsert> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkInsert {
                source: filename.to_string(),
                page_number: chunk.page_number,
                chunk_index: chunk.index,
                start_index: chunk.start_index,
                content: chunk.content,
                embedding,
            })
            .collect();
        let written = self
            .store
            .upsert(&self.settings.collection, inserts)
            .await
            .map_err(IngestError::from)?;

        info!(file = filename, chunks = written, collection = %self.settings.collection, "Ingested PDF");
        Ok(IngestReport {
            source: filename.to_string(),
            pages: doc.pages.len(),
            chunks: written,
        })
    }

    /// Answer a question from the top-k most similar stored chunks.
    pub async fn answer(&self, question: &str) -> Result<Answer, RagError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion.into());
        }
        let llm = self.llm.as_ref().ok_or_else(|| {
            RagError::Config(
                "no LLM provider configured (set GROQ_API_KEY, GEMINI_API_KEY or LLM_PROVIDER)"
                    .to_string(),
            )
        })?;

        let query_vector = self
            .embedder
            .embed_query(question)
            .await
            .map_err(QueryError::from)?;
        let hits = self
            .store
            .query(&self.settings.collection, &query_vector, self.settings.top_k)
            .await
            .map_err(QueryError::from)?;
        debug!(retrieved = hits.len(), top_k = self.settings.top_k, "Retrieved context");

        let contexts: Vec<&str> = hits.iter().map(|h| h.content.as_str()).collect();
        let messages = build_messages(&contexts, question);
        let reply = llm
            .complete(messages, self.settings.temperature, self.settings.max_tokens)
            .await
            .map_err(QueryError::from)?;

        Ok(Answer {
            answer: reply.trim().to_string(),
            sources: hits.iter().map(SourceRef::from).collect(),
        })
    }

    /// Documents ingested into the configured collection.
    pub async fn documents(&self) -> Result<Vec<DocumentSummary>, RagError> {
        self.store
            .documents(&self.settings.collection)
            .await
            .map_err(|e| QueryError::from(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pdfrag_ingest::document::fixtures::{pdf_with_missing_font, pdf_with_pages};
    use pdfrag_ingest::embedding::EmbeddingError;
    use pdfrag_llm::{LlmError, Message};
    use pdfrag_store::MemoryVectorStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Bag-of-letters embedding: similar words land close together.
    struct LetterEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for LetterEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0f32; 26];
                    for c in t.to_lowercase().chars().filter(|c| c.is_ascii_lowercase()) {
                        v[(c as u8 - b'a') as usize] += 1.0;
                    }
                    v
                })
                .collect())
        }

        fn dimensions(&self) -> usize {
            26
        }
    }

    struct EchoLlm {
        prompts: Mutex<Vec<String>>,
        reply: String,
    }

    #[async_trait]
    impl LlmProvider for EchoLlm {
        async fn complete(
            &self,
            messages: Vec<Message>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, LlmError> {
            let prompt = messages.into_iter().map(|m| m.content).collect::<String>();
            self.prompts.lock().unwrap().push(prompt);
            Ok(self.reply.clone())
        }
    }

    struct Fixture {
        embedder: Arc<LetterEmbedder>,
        store: Arc<MemoryVectorStore>,
        llm: Arc<EchoLlm>,
        pipeline: RagPipeline,
    }

    fn fixture(with_llm: bool, settings: RagSettings) -> Fixture {
        let embedder = Arc::new(LetterEmbedder {
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(MemoryVectorStore::new());
        let llm = Arc::new(EchoLlm {
            prompts: Mutex::new(Vec::new()),
            reply: "  I don't have enough information\n".to_string(),
        });
        let pipeline = RagPipeline::new(
            embedder.clone(),
            store.clone(),
            with_llm.then(|| llm.clone() as Arc<dyn LlmProvider>),
            settings,
        );
        Fixture {
            embedder,
            store,
            llm,
            pipeline,
        }
    }

    async fn seed(store: &MemoryVectorStore, embedder: &LetterEmbedder, texts: &[&str]) {
        let vectors = embedder.embed_batch(texts).await.unwrap();
        let inserts = texts
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (t, v))| ChunkInsert {
                source: "notes.pdf".into(),
                page_number: 1,
                chunk_index: i,
                start_index: 0,
                content: t.to_string(),
                embedding: v,
            })
            .collect();
        store.upsert("pdf_rag", inserts).await.unwrap();
    }

    #[tokio::test]
    async fn non_pdf_is_rejected_before_any_work() {
        let f = fixture(true, RagSettings::default());
        let err = f.pipeline.ingest("notes.txt", b"hello").await.unwrap_err();

        assert!(matches!(err, RagError::Ingestion(IngestError::NotPdf(ref n)) if n == "notes.txt"));
        assert_eq!(f.embedder.calls.load(Ordering::SeqCst), 0);
        assert!(f.store.documents("pdf_rag").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreadable_pdf_is_an_extraction_error() {
        let f = fixture(true, RagSettings::default());
        let err = f.pipeline.ingest("broken.PDF", b"not a pdf at all").await.unwrap_err();

        assert!(matches!(err, RagError::Ingestion(IngestError::Extraction(_))));
        assert_eq!(f.embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn parser_panic_is_an_extraction_error() {
        let f = fixture(true, RagSettings::default());
        let bytes = pdf_with_missing_font("Dangling font reference");

        let err = f.pipeline.ingest("dangling.pdf", &bytes).await.unwrap_err();

        assert!(matches!(
            err,
            RagError::Ingestion(IngestError::Extraction(ExtractionError::PdfError(_)))
        ));
        assert_eq!(f.embedder.calls.load(Ordering::SeqCst), 0);
        assert!(f.store.documents("pdf_rag").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn two_page_pdf_is_ingested_per_page() {
        let f = fixture(true, RagSettings::default());
        let bytes = pdf_with_pages(&[
            "The capital of France is Paris.",
            "Bread is baked every morning.",
        ]);

        let report = f.pipeline.ingest("facts.pdf", &bytes).await.unwrap();
        assert_eq!(report.source, "facts.pdf");
        assert_eq!(report.pages, 2);
        assert_eq!(report.chunks, 2);

        let needle = f.embedder.embed_query("capital France Paris").await.unwrap();
        let rows = f.store.query("pdf_rag", &needle, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        let mut placed: Vec<(usize, usize, usize)> = rows
            .iter()
            .map(|r| (r.chunk_index, r.page_number, r.start_index))
            .collect();
        placed.sort();
        assert_eq!(placed, vec![(0, 1, 0), (1, 2, 0)]);
        let first = rows.iter().find(|r| r.page_number == 1).unwrap();
        assert!(first.content.contains("Paris"));
        assert!(!first.content.contains("Bread"));

        let answer = f.pipeline.answer("What is the capital of France?").await.unwrap();
        let mut pages: Vec<usize> = answer.sources.iter().map(|s| s.page_number).collect();
        pages.sort();
        assert_eq!(pages, vec![1, 2]);
        assert!(answer.sources.iter().all(|s| s.source == "facts.pdf"));
        let prompts = f.llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("Paris"));
        assert!(prompts[0].contains("Bread"));
    }

    #[tokio::test]
    async fn empty_question_is_a_query_error() {
        let f = fixture(true, RagSettings::default());
        let err = f.pipeline.answer("   \n").await.unwrap_err();
        assert!(matches!(err, RagError::Query(QueryError::EmptyQuestion)));
        assert_eq!(f.embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_llm_is_config_error_before_embedding() {
        let f = fixture(false, RagSettings::default());
        let err = f.pipeline.answer("What is this?").await.unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
        assert_eq!(f.embedder.calls.load(Ordering::SeqCst), 0);
        assert!(!f.pipeline.has_llm());
    }

    #[tokio::test]
    async fn query_before_ingest_still_asks_the_llm() {
        let f = fixture(true, RagSettings::default());
        let answer = f.pipeline.answer("What is this?").await.unwrap();

        assert_eq!(answer.answer, "I don't have enough information");
        assert!(answer.sources.is_empty());
        let prompts = f.llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Context:\n\n\nQuestion: What is this?"));
    }

    #[tokio::test]
    async fn answer_uses_top_k_context() {
        let settings = RagSettings {
            top_k: 2,
            ..RagSettings::default()
        };
        let f = fixture(true, settings);
        seed(
            &f.store,
            &f.embedder,
            &["zebra zebra", "apple banana", "banana apple pie", "xyz qqq"],
        )
        .await;

        let answer = f.pipeline.answer("  banana apple?  ").await.unwrap();
        assert_eq!(answer.sources.len(), 2);
        let mut indices: Vec<usize> = answer.sources.iter().map(|s| s.chunk_index).collect();
        indices.sort();
        assert_eq!(indices, vec![1, 2]);
        assert!(answer.sources[0].score >= answer.sources[1].score);

        let prompts = f.llm.prompts.lock().unwrap();
        assert!(prompts[0].contains("apple banana"));
        assert!(prompts[0].contains("banana apple pie"));
        assert!(!prompts[0].contains("zebra"));
        assert!(prompts[0].contains("Question: banana apple?\nAnswer:"));
    }

    #[tokio::test]
    async fn documents_lists_the_collection() {
        let f = fixture(true, RagSettings::default());
        seed(&f.store, &f.embedder, &["one", "two"]).await;

        let docs = f.pipeline.documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "notes.pdf");
        assert_eq!(docs[0].chunk_count, 2);
        assert_eq!(f.pipeline.store_backend(), "memory");
    }

    #[test]
    fn settings_follow_config() {
        let vars: std::collections::HashMap<String, String> = [
            ("VECTOR_STORE", "memory"),
            ("TOP_K", "3"),
            ("COLLECTION_NAME", "papers"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let config = Config::from_vars(&vars).unwrap();
        let settings = RagSettings::from_config(&config);
        assert_eq!(settings.top_k, 3);
        assert_eq!(settings.collection, "papers");
        assert_eq!(settings.chunk, ChunkConfig::default());
        assert_eq!(settings.batch_size, 64);
    }
}
