//! Local file storage for uploaded documents
//!
//! Files are written flat into the upload folder as `<document_id><.ext>`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Upload folder on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Open the upload folder, creating it if missing
    pub async fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a document, keeping the extension of the original filename
    pub fn path_for(&self, document_id: &str, original_filename: &str) -> PathBuf {
        let ext = Path::new(original_filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        self.root.join(format!("{}{}", document_id, ext))
    }

    /// Write an uploaded file
    pub async fn write(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        tokio::fs::write(path, data).await
    }

    /// Remove a stored file, treating an already-missing file as removed
    ///
    /// Returns `true` if a file was actually deleted.
    pub async fn remove(&self, path: &Path) -> std::io::Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Best-effort removal; failures are logged, never returned
    pub async fn discard(&self, path: &Path) {
        if let Err(e) = self.remove(path).await {
            tracing::warn!(path = %path.display(), "Failed to remove stored file: {}", e);
        }
    }
}
