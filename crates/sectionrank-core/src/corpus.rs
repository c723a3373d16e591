//! Page corpus: the flat, addressable list of pages the pipeline ranks.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Text of one page, as supplied by the extraction step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-based page number
    pub page_number: u32,
    pub text: String,
}

/// A document split into pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPages {
    /// Document identifier (file name)
    pub document_id: String,
    pub pages: Vec<PageText>,
}

impl DocumentPages {
    /// Build from page texts in order, numbering from 1
    pub fn from_texts(document_id: impl Into<String>, texts: Vec<String>) -> Self {
        let pages = texts
            .into_iter()
            .zip(1u32..)
            .map(|(text, page_number)| PageText { page_number, text })
            .collect();
        Self {
            document_id: document_id.into(),
            pages,
        }
    }
}

/// One page of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    pub document_id: String,
    /// 1-based page number
    pub page_number: u32,
    /// Page text, possibly empty
    pub raw_text: String,
}

impl TextUnit {
    /// Whether there is anything to embed
    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty()
    }
}

/// Flatten documents into text units in (document, page) order.
///
/// Page numbers must run 1, 2, 3... within each document. Empty pages are
/// kept so numbering stays aligned with the source.
pub fn build_corpus(documents: &[DocumentPages]) -> PipelineResult<Vec<TextUnit>> {
    let total: usize = documents.iter().map(|d| d.pages.len()).sum();
    let mut units = Vec::with_capacity(total);

    for document in documents {
        for (expected, page) in (1u32..).zip(&document.pages) {
            if page.page_number != expected {
                return Err(PipelineError::InvalidInput(format!(
                    "document '{}': expected page {}, found page {}",
                    document.document_id, expected, page.page_number
                )));
            }
            units.push(TextUnit {
                document_id: document.document_id.clone(),
                page_number: page.page_number,
                raw_text: page.text.clone(),
            });
        }
    }

    tracing::debug!(
        documents = documents.len(),
        units = units.len(),
        "Built page corpus"
    );

    Ok(units)
}
