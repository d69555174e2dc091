//! Category repository
//!
//! - `CategoryRepository` trait defining category data access
//! - `SqlxCategoryRepository` implementing it for SQLite and MySQL
//!
//! Names are unique per blog. A duplicate insert surfaces as a unique-constraint
//! error (see [`crate::db::is_unique_violation`]) which the category service
//! turns into a lookup of the existing row.

use crate::db::{Backend, DynDatabasePool};
use crate::models::Category;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: &Category) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get a blog's category by name, ignoring case on both drivers
    async fn get_by_name(&self, blog_id: i64, name: &str) -> Result<Option<Category>>;

    /// List a blog's categories ordered by name
    async fn list_by_blog(&self, blog_id: i64) -> Result<Vec<Category>>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_CATEGORY: &str =
    "SELECT id, blog_id, category_name, holder_id, updated_at FROM categories";

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_category_sqlite(pool, category).await,
            Backend::Mysql(pool) => create_category_mysql(pool, category).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        let sql = format!("{} WHERE id = ?", SELECT_CATEGORY);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get category by ID")?;
                Ok(row.map(|row| row_to_category_sqlite(&row)))
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get category by ID")?;
                Ok(row.map(|row| row_to_category_mysql(&row)))
            }
        }
    }

    async fn get_by_name(&self, blog_id: i64, name: &str) -> Result<Option<Category>> {
        let sql = format!("{} WHERE blog_id = ? AND category_name = ?", SELECT_CATEGORY);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let row = sqlx::query(&sql)
                    .bind(blog_id)
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get category by name")?;
                Ok(row.map(|row| row_to_category_sqlite(&row)))
            }
            Backend::Mysql(pool) => {
                let row = sqlx::query(&sql)
                    .bind(blog_id)
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .context("Failed to get category by name")?;
                Ok(row.map(|row| row_to_category_mysql(&row)))
            }
        }
    }

    async fn list_by_blog(&self, blog_id: i64) -> Result<Vec<Category>> {
        let sql = format!("{} WHERE blog_id = ? ORDER BY category_name, id", SELECT_CATEGORY);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let rows = sqlx::query(&sql)
                    .bind(blog_id)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list categories")?;
                Ok(rows.iter().map(row_to_category_sqlite).collect())
            }
            Backend::Mysql(pool) => {
                let rows = sqlx::query(&sql)
                    .bind(blog_id)
                    .fetch_all(pool)
                    .await
                    .context("Failed to list categories")?;
                Ok(rows.iter().map(row_to_category_mysql).collect())
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_category_sqlite(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let result = sqlx::query(
        r#"
        INSERT INTO categories (blog_id, category_name, holder_id, updated_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(category.blog_id)
    .bind(&category.category_name)
    .bind(category.holder_id)
    .bind(category.updated_at)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    let mut created = category.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

fn row_to_category_sqlite(row: &sqlx::sqlite::SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        blog_id: row.get("blog_id"),
        category_name: row.get("category_name"),
        holder_id: row.get("holder_id"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_category_mysql(pool: &MySqlPool, category: &Category) -> Result<Category> {
    let result = sqlx::query(
        r#"
        INSERT INTO categories (blog_id, category_name, holder_id, updated_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(category.blog_id)
    .bind(&category.category_name)
    .bind(category.holder_id)
    .bind(category.updated_at)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    let mut created = category.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

fn row_to_category_mysql(row: &sqlx::mysql::MySqlRow) -> Category {
    Category {
        id: row.get("id"),
        blog_id: row.get("blog_id"),
        category_name: row.get("category_name"),
        holder_id: row.get("holder_id"),
        updated_at: row.get("updated_at"),
    }
}
