use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

/// A post as read back from storage, with its author's username joined in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub cover: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields an author may set on create and replace on update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PostFields {
    pub title: String,
    pub summary: String,
    pub content: String,
}

impl PostFields {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if self.content.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub cover: Option<String>,
    pub author: AuthorResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            summary: post.summary,
            content: post.content,
            cover: post.cover,
            author: AuthorResponse {
                id: post.author_id,
                username: post.author_username,
            },
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}
