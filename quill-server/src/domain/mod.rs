pub mod error;
pub mod page;
pub mod post;
pub mod user;

pub use error::DomainError;
pub use page::{PageRequest, PageWindow};
pub use post::{Post, PostFields};
pub use user::{Identity, User};
