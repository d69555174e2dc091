//! User model
//!
//! A user owns blogs and writes posts. Passwords are stored as Argon2 hashes
//! produced by `services::password::hash_password`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Registration timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User. The password must already be hashed.
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            username,
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// Whether this user is the given author
    pub fn is_author_of(&self, author_id: i64) -> bool {
        self.id == author_id
    }
}

/// Registration form input (before password hashing)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login form input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    /// Username or email
    pub username_or_email: String,
    pub password: String,
}
