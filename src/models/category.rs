//! Category model
//!
//! Categories belong to a single blog and their names are unique within it.
//! Posts refer to a category through an optional id; `None` means
//! uncategorized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label shown for posts without a category
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// A category within one blog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub blog_id: i64,
    pub category_name: String,
    /// User who created the category
    pub holder_id: i64,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Create a new Category. The ID is assigned by the database.
    pub fn new(blog_id: i64, category_name: String, holder_id: i64) -> Self {
        Self {
            id: 0,
            blog_id,
            category_name,
            holder_id,
            updated_at: Utc::now(),
        }
    }
}

/// How a post form picks its category: a typed name wins over a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryChoice {
    /// Name typed into the form; created in the blog if it does not exist yet
    pub typed_name: Option<String>,
    /// Existing category picked from the list
    pub selected_id: Option<i64>,
}

impl CategoryChoice {
    pub fn typed(name: impl Into<String>) -> Self {
        Self {
            typed_name: Some(name.into()),
            selected_id: None,
        }
    }

    pub fn selected(id: i64) -> Self {
        Self {
            typed_name: None,
            selected_id: Some(id),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// The typed name, trimmed, if it is not blank
    pub fn typed_name(&self) -> Option<&str> {
        self.typed_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Display label for an optional category
pub fn category_label(category: Option<&Category>) -> &str {
    category
        .map(|c| c.category_name.as_str())
        .unwrap_or(UNCATEGORIZED_LABEL)
}
