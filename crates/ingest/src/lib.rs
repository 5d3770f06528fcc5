//! Turning uploaded PDFs into embedded chunks: text extraction, chunking,
//! and the embedding backends.

pub mod document;
pub mod embedding;
