//! Data models
//!
//! Entities stored in the database, the form inputs that create them, and
//! the pagination types shared by listing pages.

mod blog;
mod category;
mod comment;
mod pagination;
mod post;
mod session;
mod user;

pub use blog::{Blog, BlogContext, BlogInput};
pub use category::{category_label, Category, CategoryChoice, UNCATEGORIZED_LABEL};
pub use comment::{Comment, CommentInput};
pub use pagination::{Page, Paginator};
pub use post::{Post, PostInput, PostState, PostSummary};
pub use session::Session;
pub use user::{LoginInput, RegisterInput, User};
