//! Post model
//!
//! A post is a draft until it carries a publication timestamp. There is no
//! transition back from published to draft.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CategoryChoice;

/// A post written by `author_id` inside blog `blog_id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub blog_id: i64,
    pub author_id: i64,
    /// `None` means uncategorized
    pub category_id: Option<i64>,
    pub title: String,
    /// Markdown source
    pub text: String,
    /// Set once at creation
    pub created_at: DateTime<Utc>,
    /// `None` while the post is a draft
    pub published_at: Option<DateTime<Utc>>,
}

/// Publication state derived from `published_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "at", rename_all = "lowercase")]
pub enum PostState {
    Draft,
    Published(DateTime<Utc>),
}

impl Post {
    /// Create a new draft. The ID is assigned by the database.
    pub fn new(
        blog_id: i64,
        author_id: i64,
        category_id: Option<i64>,
        title: String,
        text: String,
    ) -> Self {
        Self {
            id: 0,
            blog_id,
            author_id,
            category_id,
            title,
            text,
            created_at: Utc::now(),
            published_at: None,
        }
    }

    pub fn state(&self) -> PostState {
        match self.published_at {
            Some(at) => PostState::Published(at),
            None => PostState::Draft,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.published_at.is_none()
    }

    /// Stamp the post as published at `now`
    pub fn publish(&mut self, now: DateTime<Utc>) {
        self.published_at = Some(now);
    }
}

/// Submitted post form, shared by create and edit
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub category: CategoryChoice,
    /// The "save as draft" box was ticked
    pub draft: bool,
}

impl PostInput {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: CategoryChoice) -> Self {
        self.category = category;
        self
    }

    pub fn as_draft(mut self) -> Self {
        self.draft = true;
        self
    }
}

/// A post listed together with the title of its blog
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub blog_title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_is_draft() {
        let post = Post::new(1, 2, None, "Title".into(), "Body".into());

        assert!(post.is_draft());
        assert_eq!(post.state(), PostState::Draft);
        assert_eq!(post.category_id, None);
    }

    #[test]
    fn test_publish_sets_timestamp() {
        let mut post = Post::new(1, 2, Some(3), "Title".into(), "Body".into());
        let now = Utc::now();

        post.publish(now);

        assert!(!post.is_draft());
        assert_eq!(post.state(), PostState::Published(now));
    }

    #[test]
    fn test_post_input_builder() {
        let input = PostInput::new("t", "x")
            .with_category(CategoryChoice::typed("News"))
            .as_draft();

        assert!(input.draft);
        assert_eq!(input.category.typed_name(), Some("News"));
    }
}
