//! PDF text extraction
//!
//! OCR over rendered pages first; on any OCR failure the whole document is
//! re-read from its embedded text layer. The two strategies never mix.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::ocr::OcrService;
use crate::pdf::{PdfError, PdfMetadata, PdfParser};

/// Default rendering resolution for OCR
pub const DEFAULT_OCR_DPI: u32 = 300;

/// How the text of a document was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    /// Rendered pages recognized by OCR
    Ocr,
    /// Embedded PDF text layer
    Direct,
}

/// Raw text of a document
#[derive(Debug, Clone)]
pub struct Extraction {
    pub text: String,
    pub method: ExtractionMethod,
    pub metadata: PdfMetadata,
}

/// Extraction errors
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("{0}")]
    Processing(String),
}

impl From<PdfError> for ExtractError {
    fn from(e: PdfError) -> Self {
        ExtractError::Processing(e.to_string())
    }
}

/// Extracts text from PDFs with OCR and a direct-text fallback
#[derive(Clone)]
pub struct TextExtractor {
    ocr: OcrService,
    dpi: u32,
}

impl TextExtractor {
    pub fn new(ocr: OcrService, dpi: u32) -> Self {
        Self { ocr, dpi }
    }

    /// Extract the text of the PDF at `path`
    pub async fn extract(&self, path: &Path) -> Result<Extraction, ExtractError> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::error!(path = %path.display(), "File not found");
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }

        let owned = path.to_path_buf();
        let parser = blocking(move || PdfParser::open(owned)).await??;
        let parser = Arc::new(parser);

        let meta_parser = parser.clone();
        let metadata = blocking(move || meta_parser.metadata()).await??;

        tracing::info!(
            path = %path.display(),
            pages = parser.page_count(),
            "Starting OCR extraction"
        );

        match self.ocr_pages(&parser).await {
            Ok(text) => {
                tracing::info!(path = %path.display(), "Completed OCR extraction");
                Ok(Extraction {
                    text,
                    method: ExtractionMethod::Ocr,
                    metadata,
                })
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "OCR extraction failed: {}", e);
                tracing::info!("Falling back to direct PDF text extraction");

                let direct_parser = parser.clone();
                let text = blocking(move || direct_text(&direct_parser)).await??;

                tracing::info!(path = %path.display(), "Completed direct text extraction");
                Ok(Extraction {
                    text,
                    method: ExtractionMethod::Direct,
                    metadata,
                })
            }
        }
    }

    /// Render and recognize every page, stopping at the first failure
    async fn ocr_pages(&self, parser: &Arc<PdfParser>) -> Result<String, ExtractError> {
        let providers = self.ocr.available().await;
        if providers.is_empty() {
            return Err(ExtractError::Processing("no OCR provider available".to_string()));
        }

        let mut pages = Vec::with_capacity(parser.page_count());

        for page_num in 1..=parser.page_count() {
            let page_parser = parser.clone();
            let dpi = self.dpi;
            let image = blocking(move || page_parser.render_page_png(page_num, dpi)).await??;

            let result = self
                .ocr
                .recognize_with(&providers, &image)
                .await
                .map_err(|e| ExtractError::Processing(format!("page {}: {}", page_num, e)))?;

            tracing::debug!(page = page_num, provider = ?result.provider, "Page recognized");
            pages.push(result.text);
        }

        Ok(pages.join("\n"))
    }
}

/// Concatenate the embedded text of every page, one newline after each
fn direct_text(parser: &PdfParser) -> Result<String, PdfError> {
    let mut text = String::new();
    for page_num in 1..=parser.page_count() {
        let page_text = parser.page_text(page_num)?;
        if !page_text.is_empty() {
            text.push_str(&page_text);
            text.push('\n');
        }
    }
    Ok(text)
}

/// Run MuPDF work on the blocking pool
async fn blocking<T, F>(f: F) -> Result<T, ExtractError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExtractError::Processing(format!("extraction task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::MockProvider;
    use crate::pdf::test_support::{pages_pdf, text_pdf};
    use tempfile::TempDir;

    fn extractor_with(provider: Option<Arc<MockProvider>>) -> TextExtractor {
        let providers: Vec<Arc<dyn crate::ocr::OcrProviderTrait>> = match provider {
            Some(p) => vec![p],
            None => vec![],
        };
        TextExtractor::new(OcrService::with_providers("eng", providers), 72)
    }

    fn write_pdf(dir: &TempDir, lines: &[&str]) -> PathBuf {
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, text_pdf(lines)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let extractor = extractor_with(None);

        let result = extractor.extract(&dir.path().join("absent.pdf")).await;
        assert!(matches!(result, Err(ExtractError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_ocr_success_uses_ocr_text() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, &["Hello World"]);
        let provider = Arc::new(MockProvider::reading("Recognized text"));
        let extractor = extractor_with(Some(provider.clone()));

        let extraction = extractor.extract(&path).await.unwrap();
        assert_eq!(extraction.method, ExtractionMethod::Ocr);
        assert_eq!(extraction.text, "Recognized text");
        assert_eq!(extraction.metadata.page_count, 1);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_ocr_failure_falls_back_to_direct() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, &["Hello World"]);
        let extractor = extractor_with(Some(Arc::new(MockProvider::failing())));

        let extraction = extractor.extract(&path).await.unwrap();
        assert_eq!(extraction.method, ExtractionMethod::Direct);
        assert_eq!(extraction.text.trim(), "Hello World");
    }

    #[tokio::test]
    async fn test_no_ocr_provider_falls_back_to_direct() {
        let dir = TempDir::new().unwrap();
        let path = write_pdf(&dir, &["Hello World"]);
        let extractor = extractor_with(None);

        let extraction = extractor.extract(&path).await.unwrap();
        assert_eq!(extraction.method, ExtractionMethod::Direct);
        assert!(extraction.text.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_unreadable_pdf_is_processing_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        let extractor = extractor_with(Some(Arc::new(MockProvider::reading("x"))));

        let result = extractor.extract(&path).await;
        assert!(matches!(result, Err(ExtractError::Processing(_))));
    }

    #[tokio::test]
    async fn test_pages_joined_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("two.pdf");
        std::fs::write(&path, pages_pdf(&[&["Page one"], &["Page two"]])).unwrap();
        let provider = Arc::new(MockProvider::scripted(&[Some("first"), Some("second")]));
        let extractor = extractor_with(Some(provider.clone()));

        let extraction = extractor.extract(&path).await.unwrap();
        assert_eq!(extraction.method, ExtractionMethod::Ocr);
        assert_eq!(extraction.text, "first\nsecond");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_partial_ocr_is_discarded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("two.pdf");
        std::fs::write(&path, pages_pdf(&[&["Page one"], &["Page two"]])).unwrap();
        let provider = Arc::new(MockProvider::scripted(&[Some("OCR page one"), None]));
        let extractor = extractor_with(Some(provider.clone()));

        let extraction = extractor.extract(&path).await.unwrap();
        assert_eq!(extraction.method, ExtractionMethod::Direct);
        assert!(!extraction.text.contains("OCR"));
        let lines: Vec<&str> = extraction
            .text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        assert_eq!(lines, vec!["Page one", "Page two"]);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_availability_checked_once_per_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("three.pdf");
        std::fs::write(&path, pages_pdf(&[&["a"], &["b"], &["c"]])).unwrap();
        let provider = Arc::new(MockProvider::reading("page"));
        let extractor = extractor_with(Some(provider.clone()));

        let extraction = extractor.extract(&path).await.unwrap();
        assert_eq!(extraction.method, ExtractionMethod::Ocr);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.availability_check_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_page_pdf_extracts_empty_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, pages_pdf(&[])).unwrap();
        let provider = Arc::new(MockProvider::reading("never"));
        let extractor = extractor_with(Some(provider.clone()));

        let extraction = extractor.extract(&path).await.unwrap();
        assert_eq!(extraction.text, "");
        assert_eq!(extraction.metadata.page_count, 0);
        assert_eq!(provider.call_count(), 0);
    }
}
