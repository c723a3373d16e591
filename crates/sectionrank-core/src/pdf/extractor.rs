use std::path::Path;

use anyhow::{Context, Result};

use crate::corpus::DocumentPages;

/// Per-page text of one PDF
#[derive(Debug, Clone)]
pub struct ExtractedPages {
    /// Text of each page in order; index 0 is page 1
    pub pages: Vec<String>,
}

impl ExtractedPages {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Attach a document id to the pages
    pub fn into_document(self, document_id: impl Into<String>) -> DocumentPages {
        DocumentPages::from_texts(document_id, self.pages)
    }
}

/// Extract per-page text from a PDF file
pub fn extract_pages(path: &Path) -> Result<ExtractedPages> {
    let pdf_bytes = std::fs::read(path).context("Failed to read PDF file")?;
    extract_pages_from_bytes(&pdf_bytes)
}

/// Extract per-page text from PDF bytes.
///
/// Every physical page yields an entry, so a page without decodable text
/// is kept as an empty string and numbering matches the PDF.
pub fn extract_pages_from_bytes(pdf_bytes: &[u8]) -> Result<ExtractedPages> {
    let doc = lopdf::Document::load_mem(pdf_bytes).context("Failed to parse PDF")?;

    // get_pages is keyed by 1-based page number, already ordered
    let page_numbers: Vec<u32> = doc.get_pages().keys().cloned().collect();

    let pages: Vec<String> = page_numbers
        .iter()
        .map(|&page_num| match doc.extract_text(&[page_num]) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::warn!(page = page_num, error = %e, "No text extracted from page");
                String::new()
            }
        })
        .collect();

    tracing::debug!(
        pages = pages.len(),
        chars = pages.iter().map(|p| p.len()).sum::<usize>(),
        "Extracted PDF text"
    );

    Ok(ExtractedPages { pages })
}
