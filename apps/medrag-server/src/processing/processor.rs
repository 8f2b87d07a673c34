//! Document processing
//!
//! Runs extraction and normalization for one uploaded file and describes the
//! result.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::extractor::{ExtractError, ExtractionMethod, TextExtractor};
use super::normalize::{clean_text, page_overview, PageOverview};
use crate::pdf::PdfMetadata;

/// Outcome flag for a processed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Success,
    /// Extraction worked but produced no text
    SuccessNoText,
}

/// Result of processing one document
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    pub metadata: PdfMetadata,
    pub extracted_text: String,
    pub pages_overview: Vec<PageOverview>,
    pub total_pages_from_ocr_split: usize,
    pub extraction_method: ExtractionMethod,
    pub processed_at: DateTime<Utc>,
    pub status: ProcessingStatus,
}

/// Turns a stored PDF into cleaned text plus descriptive metadata
#[derive(Clone)]
pub struct DocumentProcessor {
    extractor: TextExtractor,
}

impl DocumentProcessor {
    pub fn new(extractor: TextExtractor) -> Self {
        Self { extractor }
    }

    pub async fn process(&self, path: &Path) -> Result<ProcessedDocument, ExtractError> {
        let extraction = self.extractor.extract(path).await?;

        let extracted_text = clean_text(&extraction.text);
        let pages_overview = page_overview(&extracted_text);

        let status = if extracted_text.is_empty() {
            tracing::warn!(path = %path.display(), "No text content extracted");
            ProcessingStatus::SuccessNoText
        } else {
            ProcessingStatus::Success
        };

        Ok(ProcessedDocument {
            metadata: extraction.metadata,
            total_pages_from_ocr_split: pages_overview.len(),
            pages_overview,
            extracted_text,
            extraction_method: extraction.method,
            processed_at: Utc::now(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::{MockProvider, OcrService};
    use crate::pdf::test_support::{pages_pdf, text_pdf};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn processor(provider: MockProvider) -> DocumentProcessor {
        let ocr = OcrService::with_providers("eng", vec![Arc::new(provider)]);
        DocumentProcessor::new(TextExtractor::new(ocr, 72))
    }

    #[tokio::test]
    async fn test_hello_world_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.pdf");
        std::fs::write(&path, text_pdf(&["Hello World"])).unwrap();

        let processed = processor(MockProvider::failing()).process(&path).await.unwrap();
        assert_eq!(processed.extracted_text, "Hello World");
        assert_eq!(processed.extraction_method, ExtractionMethod::Direct);
        assert_eq!(processed.status, ProcessingStatus::Success);
        assert_eq!(processed.total_pages_from_ocr_split, 1);
        assert_eq!(processed.pages_overview[0].word_count, 2);
    }

    #[tokio::test]
    async fn test_ocr_text_is_cleaned() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.pdf");
        std::fs::write(&path, text_pdf(&["ignored"])).unwrap();

        let processed = processor(MockProvider::reading("  Hello \n\n\n World \u{c}"))
            .process(&path)
            .await
            .unwrap();
        assert_eq!(processed.extracted_text, "Hello World");
        assert_eq!(processed.extraction_method, ExtractionMethod::Ocr);
    }

    #[tokio::test]
    async fn test_empty_text_is_flagged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blank.pdf");
        std::fs::write(&path, text_pdf(&[])).unwrap();

        let processed = processor(MockProvider::reading(" \n ")).process(&path).await.unwrap();
        assert_eq!(processed.extracted_text, "");
        assert_eq!(processed.status, ProcessingStatus::SuccessNoText);
    }

    #[tokio::test]
    async fn test_zero_page_pdf_is_success_no_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no-pages.pdf");
        std::fs::write(&path, pages_pdf(&[])).unwrap();

        let processed = processor(MockProvider::failing()).process(&path).await.unwrap();
        assert_eq!(processed.extracted_text, "");
        assert_eq!(processed.status, ProcessingStatus::SuccessNoText);
    }
}
