use crate::application::AccessGate;
use crate::domain::{DomainError, Identity};
use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::http::header::Header;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use std::future::{ready, Ready};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "token";

/// How the session cookie is written and cleared.
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub secure: bool,
    pub max_age: chrono::Duration,
}

impl SessionCookieConfig {
    pub fn session(&self, token: String) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::None)
            .max_age(time::Duration::seconds(self.max_age.num_seconds()))
            .finish()
    }

    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(SESSION_COOKIE, "")
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::None)
            .finish();
        cookie.make_removal();
        cookie
    }
}

// Токен из cookie, иначе из заголовка Authorization: Bearer
pub fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    Authorization::<Bearer>::parse(req)
        .ok()
        .map(|auth| auth.into_scheme().token().to_string())
}

fn authenticate(req: &HttpRequest) -> Result<Identity, DomainError> {
    let gate = req
        .app_data::<web::Data<Arc<AccessGate>>>()
        .ok_or_else(|| DomainError::InternalError("Access gate not configured".to_string()))?;

    gate.require_authenticated(session_token(req).as_deref())
        .inspect_err(|e| tracing::debug!("Rejected request to {}: {}", req.path(), e))
}

/// Handlers taking an `Identity` argument are protected.
impl FromRequest for Identity {
    type Error = DomainError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
