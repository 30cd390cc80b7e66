use crate::presentation::http_handlers;
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Ошибки экстракторов тоже отдаем в JSON
    cfg.app_data(web::JsonConfig::default().error_handler(http_handlers::json_error))
        .app_data(web::QueryConfig::default().error_handler(http_handlers::query_error))
        .app_data(web::PathConfig::default().error_handler(http_handlers::path_error))
        .route("/health", web::get().to(http_handlers::health))
        // Public routes - authentication
        .route("/register", web::post().to(http_handlers::register))
        .route("/login", web::post().to(http_handlers::login))
        .route("/logout", web::post().to(http_handlers::logout))
        // Protected by the Identity extractor
        .route("/profile", web::get().to(http_handlers::profile))
        .service(
            web::resource("/post")
                .route(web::get().to(http_handlers::list_posts))
                .route(web::post().to(http_handlers::create_post))
                .route(web::put().to(http_handlers::update_post)),
        )
        .service(
            web::resource("/post/{id}")
                .route(web::get().to(http_handlers::get_post))
                .route(web::delete().to(http_handlers::delete_post)),
        );
}
