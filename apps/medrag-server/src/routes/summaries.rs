//! Summary API endpoints
//!
//! - `POST /generate?document_id=`: structured analysis of one document
//! - `POST /query`: free-text question against a patient's latest document

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::DocumentRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::summary::{MedicalDocumentAnalysis, SummaryError};

const DEFAULT_QUERY: &str = "Extract all key medical information from this document.";

#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    pub document_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiKeyForm {
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    pub query: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

/// Answer to a free-text query
#[derive(Debug, Serialize)]
pub struct QueryAnswer {
    pub summary: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_summary))
        .route("/query", post(query_summary))
}

/// Generate a structured analysis for one document
async fn generate_summary(
    State(state): State<AppState>,
    Query(params): Query<GenerateParams>,
    form: Option<Form<ApiKeyForm>>,
) -> Result<Json<MedicalDocumentAnalysis>> {
    let form = form.map(|Form(form)| form).unwrap_or_default();

    let record = DocumentRepository::new(state.db())
        .get(&params.document_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    let analysis = state
        .summarizer()
        .analyze(
            record.extracted_text.as_deref(),
            None,
            form.openai_api_key.as_deref(),
        )
        .await?
        .ok_or_else(|| {
            AppError::NotFound(
                "Could not generate summary for the provided document_id.".to_string(),
            )
        })?;

    tracing::info!(document_id = %record.document_id, "Summary generated");
    Ok(Json(analysis))
}

/// Answer a question from the latest document of a patient, or of anyone
async fn query_summary(
    State(state): State<AppState>,
    Form(form): Form<QueryForm>,
) -> Result<(StatusCode, Json<QueryAnswer>)> {
    let patient_id = form.patient_id.as_deref().filter(|p| !p.trim().is_empty());

    let Some(record) = DocumentRepository::new(state.db()).latest(patient_id).await? else {
        return Ok(answer(
            StatusCode::NOT_FOUND,
            "No document found for the selected patient.",
        ));
    };

    let query = Some(form.query.trim())
        .filter(|q| !q.is_empty())
        .unwrap_or(DEFAULT_QUERY);

    tracing::info!(
        document_id = %record.document_id,
        patient_id = ?patient_id,
        "Answering summary query"
    );

    let result = state
        .summarizer()
        .analyze(
            record.extracted_text.as_deref(),
            Some(query),
            form.openai_api_key.as_deref(),
        )
        .await;

    match result {
        Ok(Some(analysis)) if !analysis.overall_summary.trim().is_empty() => {
            Ok(answer(StatusCode::OK, &analysis.overall_summary))
        }
        Ok(_) | Err(SummaryError::NoContext) => Ok(answer(StatusCode::OK, "No answer available.")),
        Err(SummaryError::MissingApiKey) => Err(SummaryError::MissingApiKey.into()),
        Err(e) => {
            tracing::error!("Error generating summary: {}", e);
            Ok(answer(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Error generating summary: {}", e),
            ))
        }
    }
}

fn answer(status: StatusCode, summary: &str) -> (StatusCode, Json<QueryAnswer>) {
    (
        status,
        Json(QueryAnswer {
            summary: summary.to_string(),
        }),
    )
}
