use crate::application::{AuthService, BlogService};
use crate::domain::page::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::domain::post::PostResponse;
use crate::domain::user::{LoginUserRequest, RegisterUserRequest};
use crate::domain::{DomainError, Identity, PageRequest};
use crate::presentation::form::PostForm;
use crate::presentation::middleware::SessionCookieConfig;
use actix_multipart::Multipart;
use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Параметры пагинации
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// Ответ со списком постов
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsResponse {
    pub posts: Vec<PostResponse>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

// Преобразование DomainError в HttpResponse
impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.to_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_upstream() {
            tracing::error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}

pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    DomainError::ValidationError(err.to_string()).into()
}

pub fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    DomainError::ValidationError(err.to_string()).into()
}

// Нечисловой id не может указывать на пост
pub fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!("Rejected path: {}", err);
    DomainError::PostNotFound.into()
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// ============== Auth Handlers ==============

pub async fn register(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse, DomainError> {
    let user = auth_service.register(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

pub async fn login(
    auth_service: web::Data<Arc<AuthService>>,
    cookies: web::Data<SessionCookieConfig>,
    req: web::Json<LoginUserRequest>,
) -> Result<HttpResponse, DomainError> {
    let (token, user) = auth_service.login(req.into_inner()).await?;

    Ok(HttpResponse::Ok()
        .cookie(cookies.session(token))
        .json(user))
}

pub async fn profile(
    auth_service: web::Data<Arc<AuthService>>,
    identity: Identity,
) -> HttpResponse {
    HttpResponse::Ok().json(auth_service.profile(identity))
}

pub async fn logout(cookies: web::Data<SessionCookieConfig>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(cookies.removal())
        .json(serde_json::json!({ "success": true }))
}

// ============== Post Handlers ==============

pub async fn list_posts(
    blog_service: web::Data<Arc<BlogService>>,
    query: web::Query<PaginationQuery>,
) -> Result<HttpResponse, DomainError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    tracing::info!("Listing posts with page={}, limit={}", page, limit);

    let window = blog_service
        .list_posts(PageRequest::new(page, limit)?)
        .await?;

    Ok(HttpResponse::Ok().json(PostsResponse {
        posts: window.items,
        total: window.total_items,
        page: window.page,
        total_pages: window.total_pages,
    }))
}

pub async fn get_post(
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();

    tracing::info!("Getting post with id={}", post_id);

    let post = blog_service.get_post(post_id).await?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn create_post(
    identity: Identity,
    blog_service: web::Data<Arc<BlogService>>,
    payload: Multipart,
) -> Result<HttpResponse, DomainError> {
    tracing::info!("Creating post for user_id={}", identity.user_id);

    let form = PostForm::read(payload).await?;
    let post = blog_service
        .create_post(&identity, form.fields, form.cover)
        .await?;

    Ok(HttpResponse::Created().json(post))
}

pub async fn update_post(
    identity: Identity,
    blog_service: web::Data<Arc<BlogService>>,
    payload: Multipart,
) -> Result<HttpResponse, DomainError> {
    let form = PostForm::read(payload).await?;
    let post_id = form.post_id()?;

    tracing::info!("Updating post id={} for user_id={}", post_id, identity.user_id);

    let post = blog_service
        .update_post(post_id, &identity, form.fields, form.cover)
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

pub async fn delete_post(
    identity: Identity,
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, DomainError> {
    let post_id = path.into_inner();

    tracing::info!("Deleting post id={} for user_id={}", post_id, identity.user_id);

    blog_service.delete_post(post_id, &identity).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
