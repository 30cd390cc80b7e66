use crate::domain::{DomainError, Identity, Post};
use crate::infrastructure::jwt::JwtService;
use std::sync::Arc;

/// Precondition checks run in front of protected operations. Never mutates.
pub struct AccessGate {
    jwt_service: Arc<JwtService>,
}

impl AccessGate {
    pub fn new(jwt_service: Arc<JwtService>) -> Self {
        Self { jwt_service }
    }

    pub fn require_authenticated(&self, token: Option<&str>) -> Result<Identity, DomainError> {
        match token {
            Some(token) => self.jwt_service.verify(token),
            None => Err(DomainError::Unauthenticated),
        }
    }

    pub fn require_author(post: &Post, identity: &Identity) -> Result<(), DomainError> {
        if post.author_id != identity.user_id {
            tracing::warn!(
                "User {} attempted to modify post {} owned by {}",
                identity.user_id,
                post.id,
                post.author_id
            );
            return Err(DomainError::Forbidden);
        }
        Ok(())
    }
}
