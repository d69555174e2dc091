//! Blog repository
//!
//! - `BlogRepository` trait defining blog data access
//! - `SqlxBlogRepository` implementing it for SQLite and MySQL

use crate::db::{Backend, DynDatabasePool};
use crate::models::Blog;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Blog repository trait
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// Create a new blog
    async fn create(&self, blog: &Blog) -> Result<Blog>;

    /// Get blog by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>>;

    /// List an author's blogs, oldest first
    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Blog>>;

    /// Count an author's blogs
    async fn count_by_author(&self, author_id: i64) -> Result<i64>;

    /// Set the blog's last-activity timestamp.
    ///
    /// Returns `false` if no blog with this ID exists.
    async fn touch(&self, id: i64, at: DateTime<Utc>) -> Result<bool>;
}

/// SQLx-based blog repository implementation
pub struct SqlxBlogRepository {
    pool: DynDatabasePool,
}

impl SqlxBlogRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BlogRepository> {
        Arc::new(Self::new(pool))
    }
}

const BLOG_COLUMNS: &str = "id, author_id, title, description, created_at, published_at";

#[async_trait]
impl BlogRepository for SqlxBlogRepository {
    async fn create(&self, blog: &Blog) -> Result<Blog> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_blog_sqlite(pool, blog).await,
            Backend::Mysql(pool) => create_blog_mysql(pool, blog).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Blog>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_blog_by_id_sqlite(pool, id).await,
            Backend::Mysql(pool) => get_blog_by_id_mysql(pool, id).await,
        }
    }

    async fn list_by_author(&self, author_id: i64) -> Result<Vec<Blog>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_blogs_by_author_sqlite(pool, author_id).await,
            Backend::Mysql(pool) => list_blogs_by_author_mysql(pool, author_id).await,
        }
    }

    async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM blogs WHERE author_id = ?";
        let count = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(author_id)
                .fetch_one(pool)
                .await
                .map(|row| row.get::<i64, _>("count")),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(author_id)
                .fetch_one(pool)
                .await
                .map(|row| row.get::<i64, _>("count")),
        }
        .context("Failed to count blogs")?;

        Ok(count)
    }

    async fn touch(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let sql = "UPDATE blogs SET published_at = ? WHERE id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(at)
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(at)
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to touch blog")?;

        Ok(affected > 0)
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_blog_sqlite(pool: &SqlitePool, blog: &Blog) -> Result<Blog> {
    let result = sqlx::query(
        r#"
        INSERT INTO blogs (author_id, title, description, created_at, published_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(blog.author_id)
    .bind(&blog.title)
    .bind(&blog.description)
    .bind(blog.created_at)
    .bind(blog.published_at)
    .execute(pool)
    .await
    .context("Failed to create blog")?;

    let mut created = blog.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn get_blog_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Blog>> {
    let row = sqlx::query(&format!("SELECT {} FROM blogs WHERE id = ?", BLOG_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog by ID")?;

    Ok(row.map(|row| row_to_blog_sqlite(&row)))
}

async fn list_blogs_by_author_sqlite(pool: &SqlitePool, author_id: i64) -> Result<Vec<Blog>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM blogs WHERE author_id = ? ORDER BY created_at, id",
        BLOG_COLUMNS
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to list blogs by author")?;

    Ok(rows.iter().map(row_to_blog_sqlite).collect())
}

fn row_to_blog_sqlite(row: &sqlx::sqlite::SqliteRow) -> Blog {
    Blog {
        id: row.get("id"),
        author_id: row.get("author_id"),
        title: row.get("title"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        published_at: row.get("published_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_blog_mysql(pool: &MySqlPool, blog: &Blog) -> Result<Blog> {
    let result = sqlx::query(
        r#"
        INSERT INTO blogs (author_id, title, description, created_at, published_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(blog.author_id)
    .bind(&blog.title)
    .bind(&blog.description)
    .bind(blog.created_at)
    .bind(blog.published_at)
    .execute(pool)
    .await
    .context("Failed to create blog")?;

    let mut created = blog.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn get_blog_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Blog>> {
    let row = sqlx::query(&format!("SELECT {} FROM blogs WHERE id = ?", BLOG_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get blog by ID")?;

    Ok(row.map(|row| row_to_blog_mysql(&row)))
}

async fn list_blogs_by_author_mysql(pool: &MySqlPool, author_id: i64) -> Result<Vec<Blog>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM blogs WHERE author_id = ? ORDER BY created_at, id",
        BLOG_COLUMNS
    ))
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to list blogs by author")?;

    Ok(rows.iter().map(row_to_blog_mysql).collect())
}

fn row_to_blog_mysql(row: &sqlx::mysql::MySqlRow) -> Blog {
    Blog {
        id: row.get("id"),
        author_id: row.get("author_id"),
        title: row.get("title"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        published_at: row.get("published_at"),
    }
}
