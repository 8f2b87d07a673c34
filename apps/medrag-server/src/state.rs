//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::Config;
use crate::ocr::OcrService;
use crate::processing::{DocumentProcessor, TextExtractor};
use crate::storage::LocalStorage;
use crate::summary::{LlmClient, OpenAiClient, Summarizer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    storage: LocalStorage,
    processor: DocumentProcessor,
    summarizer: Summarizer,
}

impl AppState {
    /// Create the application state with the configured OCR providers and
    /// an OpenAI client
    ///
    /// Checks the OCR providers once; when none is reachable every upload
    /// falls back to the embedded text layer.
    pub async fn new(config: Config, db: SqlitePool, storage: LocalStorage) -> Self {
        let ocr = OcrService::new(&config.ocr);

        let available = ocr.available_providers().await;
        if available.is_empty() {
            tracing::warn!(
                "No OCR provider available; documents will use direct text extraction"
            );
        } else {
            tracing::info!("Available OCR providers: {:?}", available);
        }

        let llm = Arc::new(OpenAiClient::new(&config.llm));
        Self::with_services(config, db, storage, ocr, llm)
    }

    /// Create the application state over explicit OCR and LLM backends
    pub fn with_services(
        config: Config,
        db: SqlitePool,
        storage: LocalStorage,
        ocr: OcrService,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        let processor = DocumentProcessor::new(TextExtractor::new(ocr, config.ocr.dpi));
        let summarizer = Summarizer::new(llm, config.llm.api_key.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                storage,
                processor,
                summarizer,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the upload storage
    pub fn storage(&self) -> &LocalStorage {
        &self.inner.storage
    }

    pub fn processor(&self) -> &DocumentProcessor {
        &self.inner.processor
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.inner.summarizer
    }
}
