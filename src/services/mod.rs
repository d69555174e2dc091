//! Services layer
//!
//! Business rules on top of the repositories. Each service has its own
//! `thiserror` error type; the web layer maps them onto HTTP responses.

pub mod blog;
pub mod category;
pub mod comment;
pub mod markdown;
pub mod password;
pub mod post;
pub mod user;

pub use blog::{BlogService, BlogServiceError};
pub use category::{CategoryService, CategoryServiceError};
pub use comment::{CommentService, CommentServiceError};
pub use markdown::MarkdownRenderer;
pub use password::{hash_password, verify_password};
pub use post::{PostDetail, PostService, PostServiceError, PostSettings};
pub use user::{UserService, UserServiceError};
