//! Document API endpoints under `/api/documents`
//!
//! - `POST /upload`: store, process and record a PDF
//! - `GET /`: list records
//! - `GET /patients/ids`: distinct patient ids
//! - `GET /:id`: record metadata
//! - `GET /:id/text?page=N`: stored text, whole or one page
//! - `DELETE /:id`: remove the record and its file

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{DocumentRecord, DocumentRepository, NewDocument};
use crate::error::{AppError, Result};
use crate::processing::{split_pages, ProcessedDocument};
use crate::state::AppState;

/// Record metadata as exposed over HTTP (no text)
#[derive(Debug, Serialize)]
pub struct DocumentInfo {
    pub document_id: String,
    pub original_filename: String,
    pub file_path: String,
    pub collection_name: Option<String>,
    pub uploaded_at: String,
    pub patient_id: Option<String>,
}

impl From<DocumentRecord> for DocumentInfo {
    fn from(record: DocumentRecord) -> Self {
        Self {
            document_id: record.document_id,
            original_filename: record.original_filename,
            file_path: record.file_path,
            collection_name: record.collection_name,
            uploaded_at: record.uploaded_at,
            patient_id: record.patient_id,
        }
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub document_id: String,
    pub collection_name: Option<String>,
    pub metadata: UploadMetadata,
}

#[derive(Serialize)]
pub struct UploadMetadata {
    pub document_id: String,
    pub filename: String,
    pub file_path: String,
    pub uploaded_at: String,
    #[serde(flatten)]
    pub processed: ProcessedDocument,
    pub collection_name: Option<String>,
    pub patient_id: Option<String>,
}

#[derive(Serialize)]
pub struct PatientIdsResponse {
    pub patient_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextQuery {
    pub page: Option<i64>,
}

#[derive(Serialize)]
pub struct TextResponse {
    pub document_id: String,
    pub page: Option<i64>,
    pub content: String,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub document_id: String,
}

/// Create the documents router
///
/// Paths are absolute so the listing answers with and without a trailing
/// slash. `max_upload_size` bounds the whole request body; larger uploads are
/// rejected with 413.
pub fn router(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/api/documents", get(list_documents))
        .route("/api/documents/", get(list_documents))
        .route("/api/documents/upload", post(upload_document))
        .route("/api/documents/patients/ids", get(patient_ids))
        .route(
            "/api/documents/:id",
            get(get_document).delete(delete_document),
        )
        .route("/api/documents/:id/text", get(get_document_text))
        .layer(DefaultBodyLimit::max(max_upload_size))
}

/// List all document records
async fn list_documents(State(state): State<AppState>) -> Result<Json<Vec<DocumentInfo>>> {
    let records = DocumentRepository::new(state.db()).list().await?;
    Ok(Json(records.into_iter().map(DocumentInfo::from).collect()))
}

/// Upload and process a document
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let mut file: Option<(String, Bytes)> = None;
    let mut patient_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await?;
                tracing::debug!(file_name = %filename, size = data.len(), "Received file field");
                file = Some((filename, data));
            }
            "patient_id" => {
                let value = field.text().await?;
                patient_id = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    let (filename, data) = match file {
        Some((filename, data)) if !filename.is_empty() => (filename, data),
        _ => return Err(AppError::BadRequest("No file provided".to_string())),
    };

    let uploads = &state.config().uploads;
    if !uploads.is_allowed(&filename) {
        let allowed: Vec<&str> = uploads.allowed_extensions.iter().map(String::as_str).collect();
        return Err(AppError::BadRequest(format!(
            "File type not allowed. Allowed types: {}",
            allowed.join(", ")
        )));
    }

    let document_id = Uuid::new_v4().to_string();
    let storage = state.storage();
    let path = storage.path_for(&document_id, &filename);

    if let Err(e) = storage.write(&path, &data).await {
        storage.discard(&path).await;
        return Err(e.into());
    }

    let processed = match state.processor().process(&path).await {
        Ok(processed) => processed,
        Err(e) => {
            tracing::error!(document_id = %document_id, "Error processing document: {}", e);
            storage.discard(&path).await;
            return Err(e.into());
        }
    };

    let file_path = path.to_string_lossy().into_owned();
    let new_doc = NewDocument {
        document_id: document_id.clone(),
        original_filename: filename.clone(),
        file_path: file_path.clone(),
        patient_id: patient_id.clone(),
        extracted_text: processed.extracted_text.clone(),
    };

    let record = match DocumentRepository::new(state.db()).create(&new_doc).await {
        Ok(record) => record,
        Err(e) => {
            storage.discard(&path).await;
            return Err(e);
        }
    };

    tracing::info!(
        document_id = %document_id,
        file_name = %filename,
        patient_id = ?patient_id,
        method = ?processed.extraction_method,
        "Upload succeeded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Document uploaded and processed successfully".to_string(),
            document_id: document_id.clone(),
            collection_name: None,
            metadata: UploadMetadata {
                document_id,
                filename,
                file_path,
                uploaded_at: record.uploaded_at,
                processed,
                collection_name: None,
                patient_id,
            },
        }),
    ))
}

/// Distinct patient ids across all records
async fn patient_ids(State(state): State<AppState>) -> Result<Json<PatientIdsResponse>> {
    let patient_ids = DocumentRepository::new(state.db()).patient_ids().await?;
    Ok(Json(PatientIdsResponse { patient_ids }))
}

/// Get record metadata by id
async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentInfo>> {
    if id.is_empty() || id == "undefined" {
        return Err(AppError::BadRequest("Missing or invalid document_id".to_string()));
    }

    let record = DocumentRepository::new(state.db())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    Ok(Json(record.into()))
}

/// Get the stored text of a document, or one page of it
async fn get_document_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TextQuery>,
) -> Result<Json<TextResponse>> {
    let record = DocumentRepository::new(state.db())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    let text = record
        .extracted_text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::NotFound("No extracted text found for this document".to_string()))?;

    let content = match query.page {
        Some(page) => {
            let pages = split_pages(&text);
            let index = page
                .checked_sub(1)
                .and_then(|i| usize::try_from(i).ok())
                .filter(|&i| i < pages.len())
                .ok_or_else(|| AppError::NotFound("Page not found".to_string()))?;
            pages[index].to_string()
        }
        None => text,
    };

    Ok(Json(TextResponse {
        document_id: record.document_id,
        page: query.page,
        content,
    }))
}

/// Delete a record and its backing file
async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let record = DocumentRepository::new(state.db())
        .delete(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

    state
        .storage()
        .discard(std::path::Path::new(&record.file_path))
        .await;

    tracing::info!(document_id = %id, "Document deleted");

    Ok(Json(DeleteResponse {
        message: format!("Document {} deleted successfully", id),
        document_id: id,
    }))
}
