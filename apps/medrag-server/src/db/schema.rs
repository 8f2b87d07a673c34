//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Create the tables if they do not exist yet
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    document_id TEXT PRIMARY KEY,
    original_filename TEXT NOT NULL,
    file_path TEXT NOT NULL,
    -- Always NULL; retained for compatibility with older databases
    collection_name TEXT,
    patient_id TEXT,
    uploaded_at TEXT NOT NULL,
    extracted_text TEXT
);

CREATE INDEX IF NOT EXISTS idx_documents_patient_id ON documents(patient_id);
CREATE INDEX IF NOT EXISTS idx_documents_uploaded_at ON documents(uploaded_at);
"#;
