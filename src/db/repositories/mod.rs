//! Database repositories
//!
//! One repository per entity. Each is a trait plus a SQLx implementation that
//! dispatches on the configured driver.

pub mod blog;
pub mod category;
pub mod comment;
pub mod post;
pub mod session;
pub mod user;

#[cfg(test)]
pub(crate) mod fixtures;

pub use blog::{BlogRepository, SqlxBlogRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
