//! OCR Service
//!
//! Orchestrates OCR providers in their configured order.

use std::sync::Arc;

use super::{
    provider::{OcrProviderTrait, OllamaProvider, TesseractProvider},
    types::{OcrError, OcrProvider, OcrResult},
};
use crate::config::OcrConfig;

/// OCR service for recognizing rendered PDF pages
#[derive(Clone)]
pub struct OcrService {
    language: String,
    providers: Vec<Arc<dyn OcrProviderTrait>>,
}

impl OcrService {
    /// Create a new OCR service from configuration
    pub fn new(config: &OcrConfig) -> Self {
        let providers = config
            .providers
            .iter()
            .map(|provider| -> Arc<dyn OcrProviderTrait> {
                match provider {
                    OcrProvider::Tesseract => Arc::new(TesseractProvider::new(config.dpi)),
                    OcrProvider::Ollama => {
                        Arc::new(OllamaProvider::new(&config.ollama_url, &config.ollama_model))
                    }
                }
            })
            .collect();

        Self::with_providers(&config.language, providers)
    }

    /// Create a service over an explicit provider list
    pub fn with_providers(language: &str, providers: Vec<Arc<dyn OcrProviderTrait>>) -> Self {
        Self {
            language: language.to_string(),
            providers,
        }
    }

    /// Providers that currently report themselves available, in order
    pub async fn available(&self) -> Vec<Arc<dyn OcrProviderTrait>> {
        let mut available = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            if provider.is_available().await {
                available.push(provider.clone());
            }
        }
        available
    }

    /// Get available providers
    pub async fn available_providers(&self) -> Vec<OcrProvider> {
        self.available()
            .await
            .iter()
            .map(|provider| provider.provider_type())
            .collect()
    }

    /// Perform OCR on a page image, trying providers in order
    pub async fn recognize(&self, image_data: &[u8]) -> Result<OcrResult, OcrError> {
        let providers = self.available().await;
        self.recognize_with(&providers, image_data).await
    }

    /// Perform OCR with an already resolved provider list
    ///
    /// Lets a multi-page run check availability once instead of per page.
    pub async fn recognize_with(
        &self,
        providers: &[Arc<dyn OcrProviderTrait>],
        image_data: &[u8],
    ) -> Result<OcrResult, OcrError> {
        let mut last_error = None;

        for provider in providers {
            match provider.recognize(image_data, &self.language).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(
                        "OCR provider {:?} failed: {}, trying next",
                        provider.provider_type(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            OcrError::ProviderNotAvailable("No OCR providers available".to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::provider::MockProvider;

    #[test]
    fn test_ocr_service_from_config() {
        let config = crate::config::Config::default().ocr;
        let service = OcrService::new(&config);
        assert_eq!(service.providers.len(), 1);
        assert_eq!(service.providers[0].provider_type(), OcrProvider::Tesseract);
    }

    #[tokio::test]
    async fn test_no_providers() {
        let service = OcrService::with_providers("eng", vec![]);
        let result = service.recognize(b"png").await;
        assert!(matches!(result, Err(OcrError::ProviderNotAvailable(_))));
    }

    #[tokio::test]
    async fn test_falls_through_to_next_provider() {
        let failing = Arc::new(MockProvider::failing());
        let reading = Arc::new(MockProvider::reading("Hello"));
        let service = OcrService::with_providers("eng", vec![failing.clone(), reading.clone()]);

        let result = service.recognize(b"png").await.unwrap();
        assert_eq!(result.text, "Hello");
        assert_eq!(failing.call_count(), 1);
        assert_eq!(reading.call_count(), 1);
    }

    #[tokio::test]
    async fn test_skips_unavailable_provider() {
        let mut offline = MockProvider::reading("never");
        offline.available = false;
        let offline = Arc::new(offline);
        let service = OcrService::with_providers("eng", vec![offline.clone()]);

        assert!(service.available_providers().await.is_empty());
        assert!(matches!(
            service.recognize(b"png").await,
            Err(OcrError::ProviderNotAvailable(_))
        ));
        assert_eq!(offline.call_count(), 0);
    }

    #[tokio::test]
    async fn test_reports_last_provider_error() {
        let service = OcrService::with_providers("eng", vec![Arc::new(MockProvider::failing())]);
        assert!(matches!(
            service.recognize(b"png").await,
            Err(OcrError::ProcessingError(_))
        ));
    }

    #[tokio::test]
    async fn test_recognize_with_resolved_providers() {
        let reading = Arc::new(MockProvider::reading("Hello"));
        let service = OcrService::with_providers("eng", vec![reading.clone()]);

        let providers = service.available().await;
        assert_eq!(providers.len(), 1);
        for _ in 0..3 {
            let result = service.recognize_with(&providers, b"png").await.unwrap();
            assert_eq!(result.text, "Hello");
        }

        assert_eq!(reading.availability_check_count(), 1);
        assert_eq!(reading.call_count(), 3);
    }
}
