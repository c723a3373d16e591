//! PDF page text extraction

pub mod extractor;

pub use extractor::{extract_pages, extract_pages_from_bytes, ExtractedPages};
