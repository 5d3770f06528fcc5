pub mod chunker;
#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;
mod pdf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0} (only PDF files are accepted)")]
    UnsupportedType(String),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
}

/// A page of extracted text.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number.
    pub page_number: usize,
    /// The extracted text content, trimmed.
    pub text: String,
}

/// Result of extracting text from a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Uploaded filename.
    pub filename: String,
    /// Non-blank pages in document order.
    pub pages: Vec<PageContent>,
}

impl ExtractedDocument {
    /// Total character count across all pages.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }
}

/// Whether `filename` carries a `.pdf` suffix (case-insensitive).
pub fn is_pdf(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

/// Extract text from PDF bytes. Any other file type is rejected untouched.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<ExtractedDocument, ExtractionError> {
    if !is_pdf(filename) {
        let ext = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_else(|| "(none)".to_string());
        return Err(ExtractionError::UnsupportedType(ext));
    }

    Ok(ExtractedDocument {
        filename: filename.to_string(),
        pages: pdf::extract_pdf(bytes)?,
    })
}
