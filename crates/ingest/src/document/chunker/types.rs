//! Chunk configuration and output types.

// ── Configuration ───────────────────────────────────────────────────────────

/// Separators tried in order; `""` means "between any two characters".
pub(crate) const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Configuration for the chunking engine. Sizes are in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum characters per chunk (default: 1000).
    pub chunk_size: usize,
    /// Characters shared by neighbouring chunks (default: 200).
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

// ── Output ──────────────────────────────────────────────────────────────────

/// A window of text together with where it starts in its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    /// Character offset of `content` in the source text.
    pub start_index: usize,
    pub content: String,
}

/// A chunk of a document with metadata for attribution.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 0-based index within the document.
    pub index: usize,
    /// The chunk text content.
    pub content: String,
    /// 1-based PDF page the chunk was cut from.
    pub page_number: usize,
    /// Character offset of the chunk inside its page text.
    pub start_index: usize,
}
