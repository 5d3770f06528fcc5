use super::{ExtractionError, PageContent};

/// Text of every page, in order. pdf-extract can panic on malformed input,
/// so async callers should run this on a blocking thread.
pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageContent>, ExtractionError> {
    let raw = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    let pages = number_pages(raw);
    if pages.is_empty() {
        // Scanned/image-only PDFs land here; the caller decides how to report it.
        tracing::warn!("PDF contains no extractable text layer");
    }
    Ok(pages)
}

/// Blank pages are dropped but keep their numbering.
pub(crate) fn number_pages(raw: Vec<String>) -> Vec<PageContent> {
    raw.into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| PageContent {
            page_number: i + 1,
            text: text.trim().to_string(),
        })
        .collect()
}
