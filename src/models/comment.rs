//! Comment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reader comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: i64, author_name: String, text: String) -> Self {
        Self {
            id: 0,
            post_id,
            author_name,
            text,
            created_at: Utc::now(),
        }
    }
}

/// Comment form input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentInput {
    pub author_name: String,
    pub text: String,
}
