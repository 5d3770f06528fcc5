//! Recursive splitting of page text and per-page document chunking.

use super::helpers::{char_len, find_from, merge_splits, split_keeping_separator};
use super::types::{Chunk, ChunkConfig, TextSpan, SEPARATORS};
use crate::document::ExtractedDocument;

/// Split `text` into overlapping spans, each tagged with its start offset.
pub fn split_text(text: &str, config: &ChunkConfig) -> Vec<TextSpan> {
    let windows = split_recursive(text, SEPARATORS, config);

    let mut spans = Vec::with_capacity(windows.len());
    let mut index = 0usize;
    let mut previous_len = 0usize;
    for content in windows {
        let search_from = (index + previous_len).saturating_sub(config.chunk_overlap);
        index = find_from(text, &content, search_from).unwrap_or(search_from);
        previous_len = char_len(&content);
        spans.push(TextSpan {
            start_index: index,
            content,
        });
    }
    spans
}

/// Chunk every page separately (no overlap across page boundaries) and
/// number the chunks across the whole document.
pub fn chunk_document(doc: &ExtractedDocument, config: &ChunkConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for page in &doc.pages {
        for span in split_text(&page.text, config) {
            let index = chunks.len();
            chunks.push(Chunk {
                index,
                content: span.content,
                page_number: page.page_number,
                start_index: span.start_index,
            });
        }
    }
    chunks
}

fn split_recursive(text: &str, separators: &[&str], config: &ChunkConfig) -> Vec<String> {
    // First separator present in the text wins; "" always matches.
    let mut separator = "";
    let mut remaining: &[&str] = &[];
    for (i, &sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            break;
        }
        if text.contains(sep) {
            separator = sep;
            remaining = &separators[i + 1..];
            break;
        }
    }

    let mut chunks = Vec::new();
    let mut small: Vec<&str> = Vec::new();
    for piece in split_keeping_separator(text, separator) {
        if char_len(piece) < config.chunk_size {
            small.push(piece);
            continue;
        }
        if !small.is_empty() {
            chunks.extend(merge_splits(&small, config));
            small.clear();
        }
        if remaining.is_empty() {
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }
        } else {
            chunks.extend(split_recursive(piece, remaining, config));
        }
    }
    if !small.is_empty() {
        chunks.extend(merge_splits(&small, config));
    }
    chunks
}
