//! Blog model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, User};

/// A blog owned by one author. An author may own several blogs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Blog {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Last time a post in this blog was created or edited
    pub published_at: Option<DateTime<Utc>>,
}

impl Blog {
    pub fn new(author_id: i64, title: String, description: Option<String>) -> Self {
        Self {
            id: 0, // Will be set by the database
            author_id,
            title,
            description,
            created_at: Utc::now(),
            published_at: None,
        }
    }
}

/// Blog settings form input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Everything a blog-scoped page needs, loaded per request from the blog id.
#[derive(Debug, Clone, Serialize)]
pub struct BlogContext {
    pub blog: Blog,
    pub owner: User,
    pub categories: Vec<Category>,
}

impl BlogContext {
    /// Look up one of this blog's categories
    pub fn category(&self, id: i64) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }
}
