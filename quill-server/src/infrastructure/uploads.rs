use crate::domain::DomainError;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// URL prefix under which stored covers are served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// A cover image received in a multipart form, not yet written anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Cover images on local disk, named `<uuid>.<ext>`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), DomainError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tracing::info!("Upload directory ready: {}", self.dir.display());
        Ok(())
    }

    /// Writes the upload and returns the reference stored on the post.
    pub async fn save(&self, upload: CoverUpload) -> Result<String, DomainError> {
        let stored_name = match extension_of(&upload.file_name) {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };

        let path = self.dir.join(&stored_name);
        tokio::fs::write(&path, &upload.bytes).await.map_err(|e| {
            tracing::error!("Failed to write cover {}: {}", path.display(), e);
            DomainError::StorageError(format!("Failed to store cover image: {}", e))
        })?;

        tracing::debug!(
            "Stored cover {} ({} bytes) as {}",
            upload.file_name,
            upload.bytes.len(),
            stored_name
        );

        Ok(format!("{}/{}", UPLOADS_ROUTE.trim_start_matches('/'), stored_name))
    }

    /// Removes a previously saved cover. Unknown references are ignored.
    pub async fn remove(&self, reference: &str) -> Result<(), DomainError> {
        let Some(file_name) = Path::new(reference).file_name() else {
            return Ok(());
        };

        match tokio::fs::remove_file(self.dir.join(file_name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
}
