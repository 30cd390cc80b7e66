use dotenvy::dotenv;
use std::sync::Arc;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;

use application::{AccessGate, AuthService, BlogService};
use data::{post_repository::PostgresPostRepository, user_repository::PostgresUserRepository};
use infrastructure::{
    config::AppConfig,
    database::{create_pool, run_migrations},
    jwt::JwtService,
    logging::init_logging,
    uploads::{UploadStore, UPLOADS_ROUTE},
};
use presentation::{middleware::SessionCookieConfig, routes};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let config = AppConfig::from_env()?;
    init_logging(&config.log)?;

    let http_addr = config.http_addr();

    tracing::info!("Starting quill server...");
    tracing::info!("HTTP server will listen on {}", http_addr);
    tracing::info!("CORS allowed origins: {:?}", config.cors_allowed_origins);

    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.database_url, config.database_max_connections).await?;

    tracing::info!("Running database migrations...");
    run_migrations(&pool).await?;

    let uploads = Arc::new(UploadStore::new(config.upload_dir.clone()));
    uploads.ensure_dir().await?;

    tracing::info!("Initializing services...");

    let token_ttl = config.token_ttl();
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, token_ttl)?);

    // Repositories
    let user_repo = Arc::new(PostgresUserRepository::new(pool.clone()));
    let post_repo = Arc::new(PostgresPostRepository::new(pool.clone()));

    // Application services
    let auth_service = Arc::new(AuthService::new(user_repo, jwt_service.clone()));
    let blog_service = Arc::new(BlogService::new(post_repo, uploads.clone()));
    let access_gate = Arc::new(AccessGate::new(jwt_service));

    let cookies = SessionCookieConfig {
        secure: config.cookie_secure,
        max_age: token_ttl,
    };

    tracing::info!("Services initialized successfully");

    run_http_server(
        http_addr,
        config,
        auth_service,
        blog_service,
        access_gate,
        uploads,
        cookies,
    )
    .await?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Configure CORS with credentials so the session cookie crosses origins
fn configure_cors(allowed_origins: &[String]) -> actix_cors::Cors {
    use actix_cors::Cors;
    use actix_web::http::header;

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .supports_credentials()
        .max_age(3600);

    for origin in allowed_origins {
        cors = cors.allowed_origin(origin);
        tracing::debug!("Added allowed CORS origin: {}", origin);
    }

    cors
}

async fn run_http_server(
    addr: String,
    config: AppConfig,
    auth_service: Arc<AuthService>,
    blog_service: Arc<BlogService>,
    access_gate: Arc<AccessGate>,
    uploads: Arc<UploadStore>,
    cookies: SessionCookieConfig,
) -> anyhow::Result<()> {
    use actix_web::{middleware::Logger, web, App, HttpServer};

    tracing::info!("Configuring HTTP server...");

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(configure_cors(&config.cors_allowed_origins))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(blog_service.clone()))
            .app_data(web::Data::new(access_gate.clone()))
            .app_data(web::Data::new(cookies.clone()))
            .service(actix_files::Files::new(UPLOADS_ROUTE, uploads.dir()))
            .configure(routes::configure)
    })
    .bind(&addr)?
    .run();

    tracing::info!("HTTP server running on {}", addr);

    server.await?;

    Ok(())
}
