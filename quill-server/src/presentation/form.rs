//! Multipart post forms.
//!
//! The cover file is buffered in memory here and only written to disk by the
//! service, after the caller has been checked.

use crate::domain::{DomainError, PostFields};
use crate::infrastructure::uploads::CoverUpload;
use actix_multipart::{Field, Multipart};
use futures::TryStreamExt;

pub const MAX_COVER_BYTES: usize = 10 * 1024 * 1024;
const MAX_TEXT_BYTES: usize = 1024 * 1024;
const COVER_FIELD: &str = "file";

#[derive(Debug, Default)]
pub struct PostForm {
    pub id: Option<String>,
    pub fields: PostFields,
    pub cover: Option<CoverUpload>,
}

impl PostForm {
    pub async fn read(mut payload: Multipart) -> Result<Self, DomainError> {
        let mut form = PostForm::default();

        while let Some(field) = payload.try_next().await.map_err(invalid_payload)? {
            let name = field.name().unwrap_or_default().to_string();

            match name.as_str() {
                COVER_FIELD => {
                    let file_name = field
                        .content_disposition()
                        .and_then(|cd| cd.get_filename())
                        .unwrap_or_default()
                        .to_string();
                    let bytes = read_limited(field, MAX_COVER_BYTES).await?;

                    // Пустое поле файла браузер шлет без имени
                    if !file_name.is_empty() && !bytes.is_empty() && form.cover.is_none() {
                        form.cover = Some(CoverUpload { file_name, bytes });
                    }
                }
                "id" => form.id = Some(read_text(field).await?),
                "title" => form.fields.title = read_text(field).await?,
                "summary" => form.fields.summary = read_text(field).await?,
                "content" => form.fields.content = read_text(field).await?,
                other => {
                    tracing::debug!("Ignoring unknown form field: {}", other);
                    drain(field).await?;
                }
            }
        }

        Ok(form)
    }

    /// Id of the post being edited. A non-numeric id cannot name a post.
    pub fn post_id(&self) -> Result<i64, DomainError> {
        let raw = self
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DomainError::ValidationError("Post id is required".to_string()))?;

        raw.parse().map_err(|_| DomainError::PostNotFound)
    }
}

async fn read_limited(mut field: Field, limit: usize) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.try_next().await.map_err(invalid_payload)? {
        if buf.len() + chunk.len() > limit {
            return Err(DomainError::ValidationError(format!(
                "Field exceeds the {} byte limit",
                limit
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

async fn drain(mut field: Field) -> Result<(), DomainError> {
    while field.try_next().await.map_err(invalid_payload)?.is_some() {}
    Ok(())
}

async fn read_text(field: Field) -> Result<String, DomainError> {
    let bytes = read_limited(field, MAX_TEXT_BYTES).await?;
    String::from_utf8(bytes)
        .map_err(|_| DomainError::ValidationError("Form field is not valid UTF-8".to_string()))
}

fn invalid_payload(err: actix_multipart::MultipartError) -> DomainError {
    DomainError::ValidationError(format!("Invalid multipart payload: {}", err))
}
