//! Splitting and merging utilities used by the chunking strategies.
//!
//! All lengths are measured in characters so multi-byte text never gets cut
//! inside a code point.

use std::collections::VecDeque;

use super::types::ChunkConfig;

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` on `separator`, keeping each separator attached to the start
/// of the piece that follows it. An empty separator yields single characters.
/// Empty pieces are dropped.
pub(crate) fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            pieces.push(&text[start..pos]);
        }
        start = pos;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

/// Greedily merge small pieces into windows of at most `chunk_size`
/// characters. After each emitted window, pieces are dropped from the front
/// until at most `chunk_overlap` characters remain; those open the next one.
pub(crate) fn merge_splits(pieces: &[&str], config: &ChunkConfig) -> Vec<String> {
    let mut windows = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for &piece in pieces {
        let len = char_len(piece);
        if total + len > config.chunk_size && !current.is_empty() {
            if let Some(window) = join_trimmed(&current) {
                windows.push(window);
            }
            while total > config.chunk_overlap || (total + len > config.chunk_size && total > 0) {
                match current.pop_front() {
                    Some(front) => total -= char_len(front),
                    None => break,
                }
            }
        }
        current.push_back(piece);
        total += len;
    }

    if let Some(window) = join_trimmed(&current) {
        windows.push(window);
    }
    windows
}

fn join_trimmed(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Character offset of the first occurrence of `needle` at or after the
/// character offset `from`.
pub(crate) fn find_from(text: &str, needle: &str, from: usize) -> Option<usize> {
    let byte_from = match text.char_indices().nth(from) {
        Some((i, _)) => i,
        None => return None,
    };
    text[byte_from..]
        .find(needle)
        .map(|pos| from + char_len(&text[byte_from..byte_from + pos]))
}
