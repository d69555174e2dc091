//! Comment service
//!
//! Anyone may comment on a published post. Drafts take no comments.

use std::sync::Arc;

use anyhow::Context;

use crate::db::repositories::{CommentRepository, PostRepository};
use crate::models::{Comment, CommentInput};

const MAX_AUTHOR_LEN: usize = 50;
const MAX_TEXT_LEN: usize = 2000;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    #[error("Post not found: {0}")]
    NotFound(i64),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
    post_repo: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>, post_repo: Arc<dyn PostRepository>) -> Self {
        Self { repo, post_repo }
    }

    /// Comments on a post, oldest first
    pub async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, CommentServiceError> {
        let comments = self
            .repo
            .list_by_post(post_id)
            .await
            .context("Failed to list comments")?;
        Ok(comments)
    }

    /// Add a comment to a published post
    pub async fn create(
        &self,
        post_id: i64,
        input: CommentInput,
    ) -> Result<Comment, CommentServiceError> {
        let author_name = input.author_name.trim();
        let text = input.text.trim();

        if author_name.is_empty() || author_name.chars().count() > MAX_AUTHOR_LEN {
            return Err(CommentServiceError::ValidationError(format!(
                "Name must be 1 to {} characters",
                MAX_AUTHOR_LEN
            )));
        }
        if text.is_empty() || text.chars().count() > MAX_TEXT_LEN {
            return Err(CommentServiceError::ValidationError(format!(
                "Comment must be 1 to {} characters",
                MAX_TEXT_LEN
            )));
        }

        let post = self
            .post_repo
            .get_by_id(post_id)
            .await
            .context("Failed to get post")?
            .filter(|post| !post.is_draft())
            .ok_or(CommentServiceError::NotFound(post_id))?;

        let comment = Comment::new(post.id, author_name.to_string(), text.to_string());
        let created = self
            .repo
            .create(&comment)
            .await
            .context("Failed to create comment")?;

        tracing::info!(post_id, comment_id = created.id, "Comment added");
        Ok(created)
    }
}
