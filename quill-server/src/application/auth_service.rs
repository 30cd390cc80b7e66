use crate::data::user_repository::UserRepository;
use crate::domain::user::{LoginUserRequest, RegisterUserRequest, UserResponse};
use crate::domain::{DomainError, Identity};
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::password::{hash_password, verify_password};
use std::sync::Arc;

pub struct AuthService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    jwt_service: Arc<JwtService>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            user_repo,
            jwt_service,
        }
    }

    pub async fn register(&self, req: RegisterUserRequest) -> Result<UserResponse, DomainError> {
        let req = req.validated()?;
        tracing::debug!("Registering username: {}", req.username);

        match self.user_repo.find_by_username(&req.username).await {
            Ok(_) => {
                tracing::warn!("Registration failed: username {} already exists", req.username);
                return Err(DomainError::UserAlreadyExists);
            }
            Err(DomainError::UserNotFound) => {}
            Err(e) => return Err(e),
        }

        let password_hash = hash_password(&req.password)?;

        // Уникальность дополнительно гарантирует индекс в БД
        let user = self.user_repo.create(&req.username, &password_hash).await?;

        tracing::info!(
            "User registered successfully: id={}, username={}",
            user.id,
            user.username
        );

        Ok(UserResponse::from(user))
    }

    /// Returns the session token together with the user.
    pub async fn login(
        &self,
        req: LoginUserRequest,
    ) -> Result<(String, UserResponse), DomainError> {
        tracing::debug!("Login attempt for username: {}", req.username);

        let user = match self.user_repo.find_by_username(req.username.trim()).await {
            Ok(u) => u,
            Err(DomainError::UserNotFound) => {
                tracing::warn!("Login failed: unknown user {}", req.username);
                return Err(DomainError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !verify_password(&req.password, &user.password_hash)? {
            tracing::warn!("Login failed: invalid password for user {}", user.username);
            return Err(DomainError::InvalidCredentials);
        }

        let token = self.jwt_service.issue(user.id, &user.username)?;

        tracing::info!(
            "User logged in successfully: id={}, username={}",
            user.id,
            user.username
        );

        Ok((token, UserResponse::from(user)))
    }

    pub fn profile(&self, identity: Identity) -> UserResponse {
        UserResponse {
            id: identity.user_id,
            username: identity.username,
        }
    }
}
