//! Document processing pipeline
//!
//! extract (OCR, falling back to the text layer) → clean → describe pages.

mod extractor;
mod normalize;
mod processor;

pub use extractor::{
    ExtractError, Extraction, ExtractionMethod, TextExtractor, DEFAULT_OCR_DPI,
};
pub use normalize::{clean_text, page_overview, split_pages, PageOverview};
pub use processor::{DocumentProcessor, ProcessedDocument, ProcessingStatus};
