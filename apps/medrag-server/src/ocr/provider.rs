//! OCR Providers
//!
//! Defines the provider trait and implementations for different OCR backends.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::types::{OcrError, OcrProvider, OcrResult};

/// OCR provider trait
#[async_trait]
pub trait OcrProviderTrait: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> OcrProvider;

    /// Check if the provider is available
    async fn is_available(&self) -> bool;

    /// Perform OCR on a PNG image
    async fn recognize(&self, image_data: &[u8], language: &str) -> Result<OcrResult, OcrError>;
}

/// Tesseract OCR provider
///
/// Drives the `tesseract` binary with the image on stdin and the text on stdout.
pub struct TesseractProvider {
    binary: String,
    dpi: u32,
}

impl TesseractProvider {
    pub fn new(dpi: u32) -> Self {
        Self {
            binary: "tesseract".to_string(),
            dpi,
        }
    }
}

#[async_trait]
impl OcrProviderTrait for TesseractProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn recognize(&self, image_data: &[u8], language: &str) -> Result<OcrResult, OcrError> {
        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", language, "--dpi"])
            .arg(self.dpi.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::ProcessingError("tesseract stdin unavailable".to_string()))?;
        stdin
            .write_all(image_data)
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to feed tesseract: {}", e)))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OcrError::ProcessingError(format!("tesseract did not finish: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        Ok(OcrResult {
            text: String::from_utf8_lossy(&output.stdout).into_owned(),
            provider: OcrProvider::Tesseract,
        })
    }
}

/// Ollama vision model provider
pub struct OllamaProvider {
    client: reqwest::Client,
    /// Ollama API URL
    base_url: String,
    /// Model name (e.g., "llava", "bakllava")
    model: String,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl OcrProviderTrait for OllamaProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Ollama
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn recognize(&self, image_data: &[u8], language: &str) -> Result<OcrResult, OcrError> {
        use base64::Engine;

        let url = format!("{}/api/generate", self.base_url);
        let image_base64 = base64::engine::general_purpose::STANDARD.encode(image_data);

        let prompt = format!(
            "Transcribe every piece of text in this scanned page exactly as written \
             (language: {}). Keep the reading order. Return only the transcription.",
            language
        );

        let request = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "images": [image_base64],
            "stream": false
        });

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to call Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let result: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to parse response: {}", e)))?;

        let text = result["response"]
            .as_str()
            .ok_or_else(|| OcrError::ApiError("Response carried no text".to_string()))?
            .to_string();

        Ok(OcrResult {
            text,
            provider: OcrProvider::Ollama,
        })
    }
}

/// Mock provider for testing
///
/// Call `k` answers with `replies[k]`; the last reply repeats once the list
/// runs out. `None` is a recognition failure.
#[cfg(test)]
pub struct MockProvider {
    pub replies: Vec<Option<String>>,
    pub available: bool,
    pub calls: std::sync::atomic::AtomicUsize,
    pub availability_checks: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockProvider {
    /// Provider that recognizes every page as `text`
    pub fn reading(text: &str) -> Self {
        Self::scripted(&[Some(text)])
    }

    /// Provider that is available but fails every page
    pub fn failing() -> Self {
        Self::scripted(&[None])
    }

    /// Provider answering successive pages from `replies`
    pub fn scripted(replies: &[Option<&str>]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.map(str::to_string)).collect(),
            available: true,
            calls: Default::default(),
            availability_checks: Default::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn availability_check_count(&self) -> usize {
        self.availability_checks.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl OcrProviderTrait for MockProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        self.availability_checks
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.available
    }

    async fn recognize(&self, _image_data: &[u8], _language: &str) -> Result<OcrResult, OcrError> {
        let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let reply = self
            .replies
            .get(call)
            .or_else(|| self.replies.last())
            .cloned()
            .flatten();
        match reply {
            Some(text) => Ok(OcrResult {
                text,
                provider: OcrProvider::Tesseract,
            }),
            None => Err(OcrError::ProcessingError("mock failure".to_string())),
        }
    }
}
