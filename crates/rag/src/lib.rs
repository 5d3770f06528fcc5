//! Retrieval-augmented generation over uploaded PDFs.
//!
//! [`RagPipeline`] ties the pieces together: ingestion runs
//! extract → chunk → embed → store, and answering runs
//! embed → retrieve → prompt → LLM.

pub mod error;
pub mod pipeline;

pub use error::{IngestError, QueryError, RagError};
pub use pipeline::{Answer, IngestReport, RagPipeline, RagSettings, SourceRef};
