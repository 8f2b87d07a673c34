//! Chat-completions clients

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::SummaryError;
use crate::config::LlmConfig;

const KEY_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote language model used for document analysis
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one system + user exchange and return the raw reply content
    async fn complete(&self, api_key: &str, system: &str, user: &str)
        -> Result<String, SummaryError>;

    /// Check that `api_key` is accepted by the remote service
    async fn verify_key(&self, api_key: &str) -> Result<(), SummaryError>;
}

/// OpenAI-compatible chat-completions client
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        api_key: &str,
        system: &str,
        user: &str,
    ) -> Result<String, SummaryError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user }
            ]
        });

        tracing::debug!(model = %self.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummaryError::Upstream(format!("Failed to parse response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| SummaryError::Upstream("Response carried no content".to_string()))
    }

    async fn verify_key(&self, api_key: &str) -> Result<(), SummaryError> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .timeout(KEY_CHECK_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_error(response).await)
        }
    }
}

fn transport_error(e: reqwest::Error) -> SummaryError {
    if e.is_timeout() {
        SummaryError::Timeout
    } else {
        SummaryError::Upstream(format!("Failed to reach the language model: {}", e))
    }
}

/// Build an error from a non-success response, preferring the API's own message
async fn status_error(response: reqwest::Response) -> SummaryError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.to_string()
            } else {
                body
            }
        });

    SummaryError::UpstreamStatus {
        status: status.as_u16(),
        message,
    }
}

/// Scripted client for testing
#[cfg(test)]
pub struct ScriptedClient {
    reply: Result<String, String>,
    pub prompts: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl ScriptedClient {
    /// Client that answers every request with `reply`
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Default::default(),
        }
    }

    /// Client whose every request fails upstream with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Default::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[cfg(test)]
#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(
        &self,
        _api_key: &str,
        _system: &str,
        user: &str,
    ) -> Result<String, SummaryError> {
        self.prompts.lock().unwrap().push(user.to_string());
        self.reply.clone().map_err(SummaryError::Upstream)
    }

    async fn verify_key(&self, api_key: &str) -> Result<(), SummaryError> {
        if api_key.starts_with("sk-") {
            Ok(())
        } else {
            Err(SummaryError::UpstreamStatus {
                status: 401,
                message: "Incorrect API key provided".to_string(),
            })
        }
    }
}
