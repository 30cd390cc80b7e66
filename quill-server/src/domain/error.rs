use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Wrong credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Post not found")]
    PostNotFound,

    #[error("Forbidden: you are not the author of this post")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn to_status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated | Self::InvalidToken(_) => 401,
            Self::Forbidden => 403,
            Self::UserNotFound | Self::PostNotFound => 404,
            Self::InvalidCredentials | Self::UserAlreadyExists | Self::ValidationError(_) => 400,
            Self::DatabaseError(_) | Self::StorageError(_) | Self::InternalError(_) => 500,
        }
    }

    /// Upstream failures whose details must stay in the logs.
    pub fn is_upstream(&self) -> bool {
        self.to_status_code() >= 500
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}
