use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

pub const MIN_USERNAME_LEN: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
}

impl RegisterUserRequest {
    /// Trims the username and checks both fields.
    pub fn validated(self) -> Result<Self, DomainError> {
        let username = self.username.trim().to_string();

        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(DomainError::ValidationError(format!(
                "Username must be at least {} characters",
                MIN_USERNAME_LEN
            )));
        }
        if self.password.is_empty() {
            return Err(DomainError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            username,
            password: self.password,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Who the caller is, as recovered from a verified session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(rename = "id")]
    pub user_id: i64,
    pub username: String,
}

impl Identity {
    pub fn new(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}
