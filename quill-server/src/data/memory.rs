//! In-memory repositories backing service and handler tests.

use super::post_repository::PostRepository;
use super::user_repository::UserRepository;
use crate::domain::{DomainError, Post, PostFields, User};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<Vec<User>>,
    posts: Mutex<Vec<Post>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    fn username_of(&self, user_id: i64) -> String {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == username) {
            return Err(DomainError::UserAlreadyExists);
        }

        let user = User {
            id: users.len() as i64 + 1,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(
        &self,
        author_id: i64,
        fields: PostFields,
        cover: Option<String>,
    ) -> Result<Post, DomainError> {
        let author_username = self.username_of(author_id);
        let mut posts = self.posts.lock().unwrap();
        let now = Utc::now();

        let post = Post {
            id: posts.iter().map(|p| p.id).max().unwrap_or(0) + 1,
            title: fields.title,
            summary: fields.summary,
            content: fields.content,
            cover,
            author_id,
            author_username,
            created_at: now,
            updated_at: now,
        };
        posts.push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(DomainError::PostNotFound)
    }

    async fn update(
        &self,
        id: i64,
        fields: PostFields,
        cover: Option<String>,
    ) -> Result<Post, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound)?;

        post.title = fields.title;
        post.summary = fields.summary;
        post.content = fields.content;
        if cover.is_some() {
            post.cover = cover;
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);

        if posts.len() == before {
            Err(DomainError::PostNotFound)
        } else {
            Ok(())
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<Post>, i64), DomainError> {
        let mut posts = self.posts.lock().unwrap().clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = posts.len() as i64;
        let page = posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok((page, total))
    }
}
