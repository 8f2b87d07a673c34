//! OpenAI API key check

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::summary::SummaryError;

#[derive(Debug, Deserialize)]
pub struct ApiKeyRequest {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub message: &'static str,
    pub status: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/test-openai-key", post(test_openai_key))
}

/// Check a key against the model listing endpoint
async fn test_openai_key(
    State(state): State<AppState>,
    Json(request): Json<ApiKeyRequest>,
) -> Result<Json<ApiKeyResponse>> {
    let api_key = request.api_key.trim();
    if api_key.is_empty() {
        return Err(AppError::BadRequest("Invalid API key".to_string()));
    }

    match state.summarizer().verify_key(api_key).await {
        Ok(()) => Ok(Json(ApiKeyResponse {
            message: "API key is valid",
            status: "success",
        })),
        Err(SummaryError::UpstreamStatus { message, .. }) => Err(AppError::BadRequest(message)),
        Err(SummaryError::Timeout) => Err(AppError::Timeout(
            "Request timeout. Please check your internet connection.".to_string(),
        )),
        Err(e) => {
            tracing::warn!("API key check failed: {}", e);
            Err(AppError::Upstream(
                "Network error. Please check your internet connection.".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ocr::MockProvider;
    use crate::routes::test_support::TestApp;
    use crate::summary::ScriptedClient;
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn app() -> TestApp {
        TestApp::new(MockProvider::failing(), ScriptedClient::replying("{}")).await
    }

    #[tokio::test]
    async fn test_valid_key() {
        let app = app().await;
        let response = app
            .server
            .post("/api/test-openai-key")
            .json(&json!({ "api_key": "sk-valid" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "success");
    }

    #[tokio::test]
    async fn test_rejected_key_carries_upstream_message() {
        let app = app().await;
        let response = app
            .server
            .post("/api/test-openai-key")
            .json(&json!({ "api_key": "bogus" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>()["message"],
            "Incorrect API key provided"
        );
    }

    #[tokio::test]
    async fn test_blank_key() {
        let app = app().await;
        app.server
            .post("/api/test-openai-key")
            .json(&json!({ "api_key": "  " }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
