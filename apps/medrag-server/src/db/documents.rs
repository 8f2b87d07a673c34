//! Document record database operations

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::{AppError, Result};

/// Document record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentRecord {
    pub document_id: String,
    pub original_filename: String,
    pub file_path: String,
    pub collection_name: Option<String>,
    pub patient_id: Option<String>,
    pub uploaded_at: String,
    pub extracted_text: Option<String>,
}

/// Data for a new document record
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub document_id: String,
    pub original_filename: String,
    pub file_path: String,
    pub patient_id: Option<String>,
    pub extracted_text: String,
}

/// Document repository
pub struct DocumentRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> DocumentRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a document by id
    pub async fn get(&self, document_id: &str) -> Result<Option<DocumentRecord>> {
        let record = sqlx::query_as::<_, DocumentRecord>(
            r#"
            SELECT document_id, original_filename, file_path, collection_name,
                   patient_id, uploaded_at, extracted_text
            FROM documents
            WHERE document_id = ?
            "#,
        )
        .bind(document_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// List all documents in storage order
    pub async fn list(&self) -> Result<Vec<DocumentRecord>> {
        let records = sqlx::query_as::<_, DocumentRecord>(
            r#"
            SELECT document_id, original_filename, file_path, collection_name,
                   patient_id, uploaded_at, extracted_text
            FROM documents
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Most recently uploaded document, optionally for one patient
    pub async fn latest(&self, patient_id: Option<&str>) -> Result<Option<DocumentRecord>> {
        let record = sqlx::query_as::<_, DocumentRecord>(
            r#"
            SELECT document_id, original_filename, file_path, collection_name,
                   patient_id, uploaded_at, extracted_text
            FROM documents
            WHERE ?1 IS NULL OR patient_id = ?1
            ORDER BY uploaded_at DESC
            LIMIT 1
            "#,
        )
        .bind(patient_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Distinct non-empty patient ids
    pub async fn patient_ids(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT patient_id
            FROM documents
            WHERE patient_id IS NOT NULL AND patient_id != ''
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Insert a new document
    ///
    /// Fails with `AppError::Conflict` if the id is already taken.
    pub async fn create(&self, data: &NewDocument) -> Result<DocumentRecord> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

        sqlx::query(
            r#"
            INSERT INTO documents (document_id, original_filename, file_path, collection_name,
                                   patient_id, uploaded_at, extracted_text)
            VALUES (?, ?, ?, NULL, ?, ?, ?)
            "#,
        )
        .bind(&data.document_id)
        .bind(&data.original_filename)
        .bind(&data.file_path)
        .bind(&data.patient_id)
        .bind(&now)
        .bind(&data.extracted_text)
        .execute(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(format!("Document {} already exists", data.document_id))
            }
            other => AppError::Database(other),
        })?;

        self.get(&data.document_id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created document".to_string()))
    }

    /// Delete a document row, returning the removed record
    pub async fn delete(&self, document_id: &str) -> Result<Option<DocumentRecord>> {
        let Some(record) = self.get(document_id).await? else {
            return Ok(None);
        };

        let result = sqlx::query("DELETE FROM documents WHERE document_id = ?")
            .bind(document_id)
            .execute(self.pool)
            .await?;

        Ok((result.rows_affected() > 0).then_some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;
    use tempfile::TempDir;

    async fn test_pool(dir: &TempDir) -> SqlitePool {
        let url = format!("sqlite:{}", dir.path().join("test.db").display());
        create_pool(&url).await.unwrap()
    }

    fn new_doc(id: &str, patient: Option<&str>) -> NewDocument {
        NewDocument {
            document_id: id.to_string(),
            original_filename: format!("{}.pdf", id),
            file_path: format!("/uploads/{}.pdf", id),
            patient_id: patient.map(String::from),
            extracted_text: "Hello World".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;
        let repo = DocumentRepository::new(&pool);

        let created = repo.create(&new_doc("doc-1", Some("p-1"))).await.unwrap();
        assert_eq!(created.document_id, "doc-1");
        assert_eq!(created.patient_id.as_deref(), Some("p-1"));
        assert_eq!(created.extracted_text.as_deref(), Some("Hello World"));
        assert!(created.collection_name.is_none());

        let fetched = repo.get("doc-1").await.unwrap().unwrap();
        assert_eq!(fetched.uploaded_at, created.uploaded_at);
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;
        let repo = DocumentRepository::new(&pool);

        repo.create(&new_doc("doc-1", None)).await.unwrap();
        let err = repo.create(&new_doc("doc-1", None)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;
        let repo = DocumentRepository::new(&pool);

        repo.create(&new_doc("doc-1", None)).await.unwrap();
        let removed = repo.delete("doc-1").await.unwrap();
        assert_eq!(removed.unwrap().document_id, "doc-1");
        assert!(repo.delete("doc-1").await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latest_and_patient_ids() {
        let dir = TempDir::new().unwrap();
        let pool = test_pool(&dir).await;
        let repo = DocumentRepository::new(&pool);

        repo.create(&new_doc("a", Some("p-1"))).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.create(&new_doc("b", Some("p-2"))).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.create(&new_doc("c", None)).await.unwrap();

        assert_eq!(repo.latest(None).await.unwrap().unwrap().document_id, "c");
        assert_eq!(repo.latest(Some("p-1")).await.unwrap().unwrap().document_id, "a");
        assert!(repo.latest(Some("p-9")).await.unwrap().is_none());

        let mut ids = repo.patient_ids().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["p-1".to_string(), "p-2".to_string()]);
        assert_eq!(repo.list().await.unwrap().len(), 3);
    }
}
