//! Post repository
//!
//! - `PostRepository` trait defining post data access
//! - `SqlxPostRepository` implementing it for SQLite and MySQL
//!
//! "Published" always means `published_at IS NOT NULL AND published_at <= now`,
//! with `now` bound from the caller so both drivers compare the same values.
//! Listings are newest first (`created_at DESC, id DESC`).

use crate::db::{Backend, DynDatabasePool};
use crate::models::{Post, PostSummary};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Save title, text, category and publication time of an existing post.
    ///
    /// Returns `false` if the post no longer exists.
    async fn update(&self, post: &Post) -> Result<bool>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Delete a post (its comments go with it)
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Stamp the publication time
    async fn set_published_at(&self, id: i64, at: DateTime<Utc>) -> Result<bool>;

    /// Most recent published posts across all blogs, with blog titles
    async fn list_recent_published(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PostSummary>>;

    /// Count a blog's published posts
    async fn count_published_by_blog(&self, blog_id: i64, now: DateTime<Utc>) -> Result<i64>;

    /// One page of a blog's published posts
    async fn list_published_by_blog(
        &self,
        blog_id: i64,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>>;

    /// Count published posts of a category within its blog
    async fn count_published_by_category(
        &self,
        blog_id: i64,
        category_id: i64,
        now: DateTime<Utc>,
    ) -> Result<i64>;

    /// One page of a category's published posts
    async fn list_published_by_category(
        &self,
        blog_id: i64,
        category_id: i64,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>>;

    /// An author's drafts, oldest first
    async fn list_drafts_by_author(&self, author_id: i64) -> Result<Vec<Post>>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

const POST_COLUMNS: &str =
    "p.id, p.blog_id, p.author_id, p.category_id, p.title, p.text, p.created_at, p.published_at";

const PUBLISHED: &str = "p.published_at IS NOT NULL AND p.published_at <= ?";

const NEWEST_FIRST: &str = "ORDER BY p.created_at DESC, p.id DESC";

/// Values bound to a listing query, in placeholder order
#[derive(Clone, Copy)]
enum Arg {
    Id(i64),
    Time(DateTime<Utc>),
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_post_sqlite(pool, post).await,
            Backend::Mysql(pool) => create_post_mysql(pool, post).await,
        }
    }

    async fn update(&self, post: &Post) -> Result<bool> {
        let sql = r#"
            UPDATE posts
            SET title = ?, text = ?, category_id = ?, published_at = ?
            WHERE id = ?
        "#;
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(&post.title)
                .bind(&post.text)
                .bind(post.category_id)
                .bind(post.published_at)
                .bind(post.id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(&post.title)
                .bind(&post.text)
                .bind(post.category_id)
                .bind(post.published_at)
                .bind(post.id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to update post")?;

        Ok(affected > 0)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts p WHERE p.id = ?", POST_COLUMNS);
        let mut posts = self.fetch_posts(&sql, &[Arg::Id(id)]).await?;
        Ok(posts.pop())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM posts WHERE id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .map(|r| r.rows_affected()),
        }
        .context("Failed to delete post")?;

        Ok(affected > 0)
    }

    async fn set_published_at(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let sql = "UPDATE posts SET published_at = ? WHERE id = ?";
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
        .context("Failed to publish post")?;

        Ok(affected > 0)
    }

    async fn list_recent_published(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<PostSummary>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_recent_published_sqlite(pool, now, limit).await,
            Backend::Mysql(pool) => list_recent_published_mysql(pool, now, limit).await,
        }
    }

    async fn count_published_by_blog(&self, blog_id: i64, now: DateTime<Utc>) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM posts p WHERE p.blog_id = ? AND {}",
            PUBLISHED
        );
        self.count(&sql, &[Arg::Id(blog_id), Arg::Time(now)]).await
    }

    async fn list_published_by_blog(
        &self,
        blog_id: i64,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts p WHERE p.blog_id = ? AND {} {} LIMIT ? OFFSET ?",
            POST_COLUMNS, PUBLISHED, NEWEST_FIRST
        );
        self.fetch_posts(
            &sql,
            &[
                Arg::Id(blog_id),
                Arg::Time(now),
                Arg::Id(limit),
                Arg::Id(offset),
            ],
        )
        .await
    }

    async fn count_published_by_category(
        &self,
        blog_id: i64,
        category_id: i64,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM posts p \
             WHERE p.blog_id = ? AND p.category_id = ? AND {}",
            PUBLISHED
        );
        self.count(
            &sql,
            &[Arg::Id(blog_id), Arg::Id(category_id), Arg::Time(now)],
        )
        .await
    }

    async fn list_published_by_category(
        &self,
        blog_id: i64,
        category_id: i64,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts p WHERE p.blog_id = ? AND p.category_id = ? AND {} {} \
             LIMIT ? OFFSET ?",
            POST_COLUMNS, PUBLISHED, NEWEST_FIRST
        );
        self.fetch_posts(
            &sql,
            &[
                Arg::Id(blog_id),
                Arg::Id(category_id),
                Arg::Time(now),
                Arg::Id(limit),
                Arg::Id(offset),
            ],
        )
        .await
    }

    async fn list_drafts_by_author(&self, author_id: i64) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts p WHERE p.author_id = ? AND p.published_at IS NULL \
             ORDER BY p.created_at ASC, p.id ASC",
            POST_COLUMNS
        );
        self.fetch_posts(&sql, &[Arg::Id(author_id)]).await
    }
}

impl SqlxPostRepository {
    async fn fetch_posts(&self, sql: &str, args: &[Arg]) -> Result<Vec<Post>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                for arg in args {
                    query = match *arg {
                        Arg::Id(v) => query.bind(v),
                        Arg::Time(v) => query.bind(v),
                    };
                }
                let rows = query.fetch_all(pool).await.context("Failed to load posts")?;
                Ok(rows.iter().map(row_to_post_sqlite).collect())
            }
            Backend::Mysql(pool) => {
                let mut query = sqlx::query(sql);
                for arg in args {
                    query = match *arg {
                        Arg::Id(v) => query.bind(v),
                        Arg::Time(v) => query.bind(v),
                    };
                }
                let rows = query.fetch_all(pool).await.context("Failed to load posts")?;
                Ok(rows.iter().map(row_to_post_mysql).collect())
            }
        }
    }

    async fn count(&self, sql: &str, args: &[Arg]) -> Result<i64> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut query = sqlx::query(sql);
                for arg in args {
                    query = match *arg {
                        Arg::Id(v) => query.bind(v),
                        Arg::Time(v) => query.bind(v),
                    };
                }
                let row = query.fetch_one(pool).await.context("Failed to count posts")?;
                Ok(row.get("count"))
            }
            Backend::Mysql(pool) => {
                let mut query = sqlx::query(sql);
                for arg in args {
                    query = match *arg {
                        Arg::Id(v) => query.bind(v),
                        Arg::Time(v) => query.bind(v),
                    };
                }
                let row = query.fetch_one(pool).await.context("Failed to count posts")?;
                Ok(row.get("count"))
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(pool: &SqlitePool, post: &Post) -> Result<Post> {
    let result = sqlx::query(
        r#"
        INSERT INTO posts (blog_id, author_id, category_id, title, text, created_at, published_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.blog_id)
    .bind(post.author_id)
    .bind(post.category_id)
    .bind(&post.title)
    .bind(&post.text)
    .bind(post.created_at)
    .bind(post.published_at)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    let mut created = post.clone();
    created.id = result.last_insert_rowid();
    Ok(created)
}

async fn list_recent_published_sqlite(
    pool: &SqlitePool,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<PostSummary>> {
    let rows = sqlx::query(&format!(
        "SELECT {}, b.title AS blog_title FROM posts p \
         JOIN blogs b ON b.id = p.blog_id WHERE {} {} LIMIT ?",
        POST_COLUMNS, PUBLISHED, NEWEST_FIRST
    ))
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list recent posts")?;

    Ok(rows
        .iter()
        .map(|row| PostSummary {
            post: row_to_post_sqlite(row),
            blog_title: row.get("blog_title"),
        })
        .collect())
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        blog_id: row.get("blog_id"),
        author_id: row.get("author_id"),
        category_id: row.get("category_id"),
        title: row.get("title"),
        text: row.get("text"),
        created_at: row.get("created_at"),
        published_at: row.get("published_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(pool: &MySqlPool, post: &Post) -> Result<Post> {
    let result = sqlx::query(
        r#"
        INSERT INTO posts (blog_id, author_id, category_id, title, text, created_at, published_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(post.blog_id)
    .bind(post.author_id)
    .bind(post.category_id)
    .bind(&post.title)
    .bind(&post.text)
    .bind(post.created_at)
    .bind(post.published_at)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    let mut created = post.clone();
    created.id = result.last_insert_id() as i64;
    Ok(created)
}

async fn list_recent_published_mysql(
    pool: &MySqlPool,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<PostSummary>> {
    let rows = sqlx::query(&format!(
        "SELECT {}, b.title AS blog_title FROM posts p \
         JOIN blogs b ON b.id = p.blog_id WHERE {} {} LIMIT ?",
        POST_COLUMNS, PUBLISHED, NEWEST_FIRST
    ))
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list recent posts")?;

    Ok(rows
        .iter()
        .map(|row| PostSummary {
            post: row_to_post_mysql(row),
            blog_title: row.get("blog_title"),
        })
        .collect())
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Post {
    Post {
        id: row.get("id"),
        blog_id: row.get("blog_id"),
        author_id: row.get("author_id"),
        category_id: row.get("category_id"),
        title: row.get("title"),
        text: row.get("text"),
        created_at: row.get("created_at"),
        published_at: row.get("published_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::fixtures;
    use chrono::Duration;

    fn at(minutes_ago: i64) -> DateTime<Utc> {
        Utc::now() - Duration::minutes(minutes_ago)
    }

    #[tokio::test]
    async fn test_create_get_and_update_post() {
        let pool = fixtures::migrated_pool().await;
        let author = fixtures::user(&pool, "alice").await;
        let blog = fixtures::blog(&pool, author.id, "Notes").await;
        let category = fixtures::category(&pool, blog.id, "Rust", author.id).await;
        let repo = SqlxPostRepository::new(pool.clone());

        let post = fixtures::post(&pool, &blog, "First", at(10), None).await;
        assert!(post.id > 0);

        let mut found = repo.get_by_id(post.id).await.unwrap().unwrap();
        assert!(found.is_draft());
        assert_eq!(found.category_id, None);

        found.title = "First, revised".to_string();
        found.category_id = Some(category.id);
        found.published_at = Some(at(1));
        assert!(repo.update(&found).await.unwrap());

        let updated = repo.get_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(updated.title, "First, revised");
        assert_eq!(updated.category_id, Some(category.id));
        assert!(!updated.is_draft());
    }

    #[tokio::test]
    async fn test_delete_post() {
        let pool = fixtures::migrated_pool().await;
        let author = fixtures::user(&pool, "alice").await;
        let blog = fixtures::blog(&pool, author.id, "Notes").await;
        let post = fixtures::post(&pool, &blog, "Gone", at(5), Some(at(5))).await;
        let repo = SqlxPostRepository::new(pool.clone());

        assert!(repo.delete(post.id).await.unwrap());
        assert!(repo.get_by_id(post.id).await.unwrap().is_none());
        assert!(!repo.delete(post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_published_at() {
        let pool = fixtures::migrated_pool().await;
        let author = fixtures::user(&pool, "alice").await;
        let blog = fixtures::blog(&pool, author.id, "Notes").await;
        let post = fixtures::post(&pool, &blog, "Draft", at(5), None).await;
        let repo = SqlxPostRepository::new(pool.clone());

        assert!(repo.set_published_at(post.id, Utc::now()).await.unwrap());
        assert!(!repo.get_by_id(post.id).await.unwrap().unwrap().is_draft());
        assert!(!repo.set_published_at(post.id + 1, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_published_listing_hides_drafts_and_future_posts() {
        let pool = fixtures::migrated_pool().await;
        let author = fixtures::user(&pool, "alice").await;
        let blog = fixtures::blog(&pool, author.id, "Notes").await;
        let other = fixtures::blog(&pool, author.id, "Other").await;

        fixtures::post(&pool, &blog, "old", at(30), Some(at(30))).await;
        fixtures::post(&pool, &blog, "new", at(10), Some(at(10))).await;
        fixtures::post(&pool, &blog, "draft", at(5), None).await;
        fixtures::post(&pool, &blog, "scheduled", at(1), Some(at(-60))).await;
        fixtures::post(&pool, &other, "elsewhere", at(2), Some(at(2))).await;
        let repo = SqlxPostRepository::new(pool.clone());

        let now = Utc::now();
        assert_eq!(repo.count_published_by_blog(blog.id, now).await.unwrap(), 2);

        let titles: Vec<String> = repo
            .list_published_by_blog(blog.id, now, 0, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["new", "old"]);

        let second_page = repo.list_published_by_blog(blog.id, now, 1, 1).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].title, "old");
    }

    #[tokio::test]
    async fn test_recent_published_carries_blog_title() {
        let pool = fixtures::migrated_pool().await;
        let author = fixtures::user(&pool, "alice").await;
        let notes = fixtures::blog(&pool, author.id, "Notes").await;
        let travel = fixtures::blog(&pool, author.id, "Travel").await;

        for i in 0..4 {
            fixtures::post(&pool, &notes, &format!("n{}", i), at(20 - i), Some(at(20 - i))).await;
        }
        fixtures::post(&pool, &travel, "t0", at(1), Some(at(1))).await;
        fixtures::post(&pool, &travel, "draft", at(0), None).await;
        let repo = SqlxPostRepository::new(pool.clone());

        let recent = repo.list_recent_published(Utc::now(), 3).await.unwrap();
        let seen: Vec<(&str, &str)> = recent
            .iter()
            .map(|s| (s.post.title.as_str(), s.blog_title.as_str()))
            .collect();
        assert_eq!(
            seen,
            vec![("t0", "Travel"), ("n3", "Notes"), ("n2", "Notes")]
        );
    }

    #[tokio::test]
    async fn test_category_listing_is_scoped() {
        let pool = fixtures::migrated_pool().await;
        let author = fixtures::user(&pool, "alice").await;
        let blog = fixtures::blog(&pool, author.id, "Notes").await;
        let rust = fixtures::category(&pool, blog.id, "Rust", author.id).await;
        let repo = SqlxPostRepository::new(pool.clone());

        let mut tagged = fixtures::post(&pool, &blog, "tagged", at(10), Some(at(10))).await;
        tagged.category_id = Some(rust.id);
        repo.update(&tagged).await.unwrap();

        let mut tagged_draft = fixtures::post(&pool, &blog, "tagged draft", at(5), None).await;
        tagged_draft.category_id = Some(rust.id);
        repo.update(&tagged_draft).await.unwrap();

        fixtures::post(&pool, &blog, "untagged", at(3), Some(at(3))).await;

        let now = Utc::now();
        assert_eq!(
            repo.count_published_by_category(blog.id, rust.id, now)
                .await
                .unwrap(),
            1
        );
        let posts = repo
            .list_published_by_category(blog.id, rust.id, now, 0, 10)
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "tagged");
    }

    #[tokio::test]
    async fn test_drafts_are_oldest_first_and_per_author() {
        let pool = fixtures::migrated_pool().await;
        let alice = fixtures::user(&pool, "alice").await;
        let bob = fixtures::user(&pool, "bob").await;
        let alice_blog = fixtures::blog(&pool, alice.id, "A").await;
        let bob_blog = fixtures::blog(&pool, bob.id, "B").await;

        fixtures::post(&pool, &alice_blog, "second", at(5), None).await;
        fixtures::post(&pool, &alice_blog, "first", at(50), None).await;
        fixtures::post(&pool, &alice_blog, "live", at(60), Some(at(60))).await;
        fixtures::post(&pool, &bob_blog, "bob's", at(70), None).await;
        let repo = SqlxPostRepository::new(pool.clone());

        let titles: Vec<String> = repo
            .list_drafts_by_author(alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
    }
}
