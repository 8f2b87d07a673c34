//! Medical document summarizer

use std::sync::Arc;

use super::client::LlmClient;
use super::prompt::{system_prompt, user_prompt};
use super::types::MedicalDocumentAnalysis;
use super::SummaryError;

/// Produces structured analyses of extracted document text
#[derive(Clone)]
pub struct Summarizer {
    client: Arc<dyn LlmClient>,
    default_api_key: Option<String>,
}

impl Summarizer {
    /// `default_api_key` is used when a request does not carry its own key
    pub fn new(client: Arc<dyn LlmClient>, default_api_key: Option<String>) -> Self {
        Self {
            client,
            default_api_key,
        }
    }

    /// Pick the request key, falling back to the configured one
    pub fn resolve_key(&self, api_key: Option<&str>) -> Result<String, SummaryError> {
        api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| self.default_api_key.clone())
            .ok_or(SummaryError::MissingApiKey)
    }

    /// Analyze a document's text
    ///
    /// Returns `Ok(None)` when the model replies with something that is not a
    /// valid analysis. Absent or empty text fails with
    /// [`SummaryError::NoContext`] before any request is made.
    pub async fn analyze(
        &self,
        text: Option<&str>,
        query: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<Option<MedicalDocumentAnalysis>, SummaryError> {
        let context = match text {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                tracing::error!("No context available for analysis");
                return Err(SummaryError::NoContext);
            }
        };
        let api_key = self.resolve_key(api_key)?;

        tracing::info!(chars = context.len(), "Invoking LLM for medical document analysis");
        let raw = self
            .client
            .complete(&api_key, &system_prompt(), &user_prompt(context, query))
            .await?;

        match serde_json::from_str::<MedicalDocumentAnalysis>(&raw) {
            Ok(analysis) => {
                tracing::info!("Successfully parsed LLM output");
                Ok(Some(analysis))
            }
            Err(e) => {
                tracing::error!(raw = %raw, "LLM output did not match the analysis schema: {}", e);
                Ok(None)
            }
        }
    }

    /// Check an API key against the remote service
    pub async fn verify_key(&self, api_key: &str) -> Result<(), SummaryError> {
        self.client.verify_key(api_key).await
    }
}
