//! Blog service
//!
//! Blog creation and lookup, the "last activity" touch, and loading the
//! per-request [`BlogContext`] from an explicit blog id.

use crate::db::repositories::{BlogRepository, CategoryRepository, UserRepository};
use crate::models::{Blog, BlogContext, BlogInput};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

const MAX_TITLE_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

/// Error types for blog service operations
#[derive(Debug, thiserror::Error)]
pub enum BlogServiceError {
    #[error("Blog not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Blog service
pub struct BlogService {
    blog_repo: Arc<dyn BlogRepository>,
    user_repo: Arc<dyn UserRepository>,
    category_repo: Arc<dyn CategoryRepository>,
}

impl BlogService {
    pub fn new(
        blog_repo: Arc<dyn BlogRepository>,
        user_repo: Arc<dyn UserRepository>,
        category_repo: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self {
            blog_repo,
            user_repo,
            category_repo,
        }
    }

    /// Create a blog owned by `author_id`
    pub async fn create(&self, author_id: i64, input: BlogInput) -> Result<Blog, BlogServiceError> {
        let title = input.title.trim();
        let description = input.description.trim();

        if title.is_empty() {
            return Err(BlogServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(BlogServiceError::ValidationError(format!(
                "Title cannot exceed {} characters",
                MAX_TITLE_LEN
            )));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(BlogServiceError::ValidationError(format!(
                "Description cannot exceed {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }

        let blog = Blog::new(
            author_id,
            title.to_string(),
            (!description.is_empty()).then(|| description.to_string()),
        );
        let created = self
            .blog_repo
            .create(&blog)
            .await
            .context("Failed to create blog")?;

        tracing::info!(blog_id = created.id, author_id, "Blog created");
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> Result<Blog, BlogServiceError> {
        self.blog_repo
            .get_by_id(id)
            .await
            .context("Failed to get blog")?
            .ok_or(BlogServiceError::NotFound(id))
    }

    pub async fn list_by_author(&self, author_id: i64) -> Result<Vec<Blog>, BlogServiceError> {
        let blogs = self
            .blog_repo
            .list_by_author(author_id)
            .await
            .context("Failed to list blogs")?;
        Ok(blogs)
    }

    pub async fn count_by_author(&self, author_id: i64) -> Result<i64, BlogServiceError> {
        let count = self
            .blog_repo
            .count_by_author(author_id)
            .await
            .context("Failed to count blogs")?;
        Ok(count)
    }

    /// Record activity on a blog by setting its `published_at` to now
    pub async fn touch(&self, blog_id: i64) -> Result<(), BlogServiceError> {
        let touched = self
            .blog_repo
            .touch(blog_id, Utc::now())
            .await
            .context("Failed to touch blog")?;

        if !touched {
            return Err(BlogServiceError::NotFound(blog_id));
        }
        tracing::debug!(blog_id, "Blog touched");
        Ok(())
    }

    /// Load the blog, its owner and its categories for one request
    pub async fn load_context(&self, blog_id: i64) -> Result<BlogContext, BlogServiceError> {
        let blog = self.get(blog_id).await?;

        let owner = self
            .user_repo
            .get_by_id(blog.author_id)
            .await
            .context("Failed to get blog owner")?
            .ok_or_else(|| anyhow::anyhow!("Blog {} has no owner", blog.id))?;

        let categories = self
            .category_repo
            .list_by_blog(blog.id)
            .await
            .context("Failed to list categories")?;

        Ok(BlogContext {
            blog,
            owner,
            categories,
        })
    }
}
