//! Recursive character chunking.
//!
//! Splits extracted page text into overlapping windows of at most
//! `chunk_size` characters, preferring paragraph, then line, then word
//! boundaries before falling back to hard cuts between characters.

mod helpers;
mod strategies;
mod types;

pub use strategies::{chunk_document, split_text};
pub use types::{Chunk, ChunkConfig, TextSpan};
