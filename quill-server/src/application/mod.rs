pub mod access_gate;
pub mod auth_service;
pub mod blog_service;

pub use access_gate::AccessGate;
pub use auth_service::AuthService;
pub use blog_service::BlogService;
