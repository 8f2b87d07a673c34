//! OCR Module
//!
//! Provides OCR (Optical Character Recognition) for rendered PDF pages.
//!
//! Supports multiple backends:
//! - Tesseract (local, requires the `tesseract` binary on PATH)
//! - Ollama vision models (local LLM)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medrag_server::ocr::OcrService;
//!
//! let service = OcrService::new(&config.ocr);
//! let result = service.recognize(&page_png).await?;
//! println!("{} via {:?}", result.text, result.provider);
//! ```

mod provider;
mod service;
mod types;

pub use provider::{OcrProviderTrait, OllamaProvider, TesseractProvider};
pub use service::OcrService;
pub use types::{OcrError, OcrProvider, OcrResult};

#[cfg(test)]
pub(crate) use provider::MockProvider;
