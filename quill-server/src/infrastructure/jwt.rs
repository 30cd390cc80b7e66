use crate::domain::{DomainError, Identity};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub iat: usize,
    pub exp: usize,
}

/// Issues and verifies session tokens. Holds no mutable state.
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, DomainError> {
        tracing::debug!(
            "Initializing JwtService with secret length: {}, ttl: {}h",
            secret.len(),
            ttl.num_hours()
        );

        if secret.is_empty() {
            return Err(DomainError::InternalError(
                "JWT secret must not be empty".to_string(),
            ));
        }
        if secret.len() < 32 {
            tracing::warn!(
                "JWT secret is too short ({} chars). Minimum recommended is 32 chars.",
                secret.len()
            );
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
            ttl,
        })
    }

    pub fn issue(&self, user_id: i64, username: &str) -> Result<String, DomainError> {
        tracing::debug!(
            "Issuing token for user_id: {}, username: {}",
            user_id,
            username
        );

        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| DomainError::InternalError("Token expiry overflow".to_string()))?;

        let claims = Claims {
            user_id,
            username: username.to_string(),
            iat: now.timestamp().max(0) as usize,
            exp: expiration.timestamp().max(0) as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode token: {}", e);
            DomainError::InternalError(format!("Failed to generate token: {}", e))
        })
    }

    pub fn verify(&self, token: &str) -> Result<Identity, DomainError> {
        if token.is_empty() {
            return Err(DomainError::Unauthenticated);
        }

        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(token_data) => {
                tracing::debug!("Token verified for user_id: {}", token_data.claims.user_id);
                Ok(Identity::new(
                    token_data.claims.user_id,
                    token_data.claims.username,
                ))
            }
            Err(e) => {
                tracing::debug!("Token verification failed: {}", e);
                Err(DomainError::InvalidToken(e.to_string()))
            }
        }
    }
}
