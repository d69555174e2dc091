//! Category service
//!
//! Categories are per blog. The post forms name a category either by typing
//! it (looked up, or created on first use) or by picking an existing one;
//! [`CategoryService::resolve`] turns that choice into an optional id.

use crate::db::is_unique_violation;
use crate::db::repositories::CategoryRepository;
use crate::models::{Category, CategoryChoice};
use anyhow::Context;
use std::sync::Arc;

const MAX_NAME_LEN: usize = 50;

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    #[error("Category not found: {0}")]
    NotFound(String),

    #[error("Category name already exists: {0}")]
    Duplicate(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>) -> Self {
        Self { repo }
    }

    /// Map a typed name or a selected id to the category to store on a post.
    ///
    /// - A non-blank typed name returns the blog's category of that name,
    ///   creating it (held by `holder_id`) if it does not exist yet.
    /// - Otherwise the selected id is returned as given, `None` meaning
    ///   uncategorized. It is not checked against `blog_id` here.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the typed name is too long
    /// - `NotFound` if a concurrent insert won the race but its row cannot be read
    pub async fn resolve(
        &self,
        typed_name: Option<&str>,
        selected_id: Option<i64>,
        blog_id: i64,
        holder_id: i64,
    ) -> Result<Option<i64>, CategoryServiceError> {
        let name = typed_name.map(str::trim).filter(|name| !name.is_empty());
        let Some(name) = name else {
            return Ok(selected_id);
        };
        validate_name(name)?;

        if let Some(existing) = self
            .repo
            .get_by_name(blog_id, name)
            .await
            .context("Failed to look up category")?
        {
            tracing::debug!(blog_id, category_id = existing.id, "Category resolved by name");
            return Ok(Some(existing.id));
        }

        let category = Category::new(blog_id, name.to_string(), holder_id);
        match self.repo.create(&category).await {
            Ok(created) => {
                tracing::info!(blog_id, category_id = created.id, name, "Category created");
                Ok(Some(created.id))
            }
            Err(e) if is_unique_violation(&e) => {
                // Created concurrently under the same name
                let existing = self
                    .repo
                    .get_by_name(blog_id, name)
                    .await
                    .context("Failed to re-read category")?
                    .ok_or_else(|| CategoryServiceError::NotFound(name.to_string()))?;
                Ok(Some(existing.id))
            }
            Err(e) => Err(e.context("Failed to create category").into()),
        }
    }

    /// [`resolve`](Self::resolve) for a submitted form choice
    pub async fn resolve_choice(
        &self,
        choice: &CategoryChoice,
        blog_id: i64,
        holder_id: i64,
    ) -> Result<Option<i64>, CategoryServiceError> {
        self.resolve(choice.typed_name(), choice.selected_id, blog_id, holder_id)
            .await
    }

    /// Create a category explicitly. Unlike `resolve`, an existing name is an error.
    pub async fn create(
        &self,
        blog_id: i64,
        name: &str,
        holder_id: i64,
    ) -> Result<Category, CategoryServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }
        validate_name(name)?;

        let category = Category::new(blog_id, name.to_string(), holder_id);
        match self.repo.create(&category).await {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => {
                Err(CategoryServiceError::Duplicate(name.to_string()))
            }
            Err(e) => Err(e.context("Failed to create category").into()),
        }
    }

    pub async fn list_for_blog(&self, blog_id: i64) -> Result<Vec<Category>, CategoryServiceError> {
        let categories = self
            .repo
            .list_by_blog(blog_id)
            .await
            .context("Failed to list categories")?;
        Ok(categories)
    }

    pub async fn get(&self, id: i64) -> Result<Category, CategoryServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get category")?
            .ok_or_else(|| CategoryServiceError::NotFound(id.to_string()))
    }
}

fn validate_name(name: &str) -> Result<(), CategoryServiceError> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CategoryServiceError::ValidationError(format!(
            "Category name cannot exceed {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(())
}
