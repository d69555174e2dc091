//! Comment repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::Comment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// Comments on a post, oldest first
    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        let sql = r#"
            INSERT INTO comments (post_id, author_name, text, created_at)
            VALUES (?, ?, ?, ?)
        "#;
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(comment.post_id)
                .bind(&comment.author_name)
                .bind(&comment.text)
                .bind(comment.created_at)
                .execute(pool)
                .await
                .map(|r| r.last_insert_rowid()),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(comment.post_id)
                .bind(&comment.author_name)
                .bind(&comment.text)
                .bind(comment.created_at)
                .execute(pool)
                .await
                .map(|r| r.last_insert_id() as i64),
        }
        .context("Failed to create comment")?;

        let mut created = comment.clone();
        created.id = id;
        Ok(created)
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let sql = r#"
            SELECT id, post_id, author_name, text, created_at
            FROM comments
            WHERE post_id = ?
            ORDER BY created_at ASC, id ASC
        "#;
        let comments = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(post_id)
                .fetch_all(pool)
                .await
                .map(|rows| {
                    rows.iter()
                        .map(|row| Comment {
                            id: row.get("id"),
                            post_id: row.get("post_id"),
                            author_name: row.get("author_name"),
                            text: row.get("text"),
                            created_at: row.get("created_at"),
                        })
                        .collect::<Vec<_>>()
                }),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(post_id)
                .fetch_all(pool)
                .await
                .map(|rows| {
                    rows.iter()
                        .map(|row| Comment {
                            id: row.get("id"),
                            post_id: row.get("post_id"),
                            author_name: row.get("author_name"),
                            text: row.get("text"),
                            created_at: row.get("created_at"),
                        })
                        .collect::<Vec<_>>()
                }),
        }
        .context("Failed to list comments")?;

        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{fixtures, PostRepository, SqlxPostRepository};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_comments_listed_oldest_first() {
        let pool = fixtures::migrated_pool().await;
        let author = fixtures::user(&pool, "alice").await;
        let blog = fixtures::blog(&pool, author.id, "Notes").await;
        let post = fixtures::post(&pool, &blog, "Hello", Utc::now(), Some(Utc::now())).await;
        let repo = SqlxCommentRepository::new(pool.clone());

        let mut late = Comment::new(post.id, "bob".into(), "second".into());
        late.created_at = Utc::now();
        let mut early = Comment::new(post.id, "carol".into(), "first".into());
        early.created_at = Utc::now() - Duration::minutes(5);

        let created = repo.create(&late).await.expect("Failed to create comment");
        assert!(created.id > 0);
        repo.create(&early).await.unwrap();

        let texts: Vec<String> = repo
            .list_by_post(post.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_comments_removed_with_post() {
        let pool = fixtures::migrated_pool().await;
        let author = fixtures::user(&pool, "alice").await;
        let blog = fixtures::blog(&pool, author.id, "Notes").await;
        let post = fixtures::post(&pool, &blog, "Hello", Utc::now(), Some(Utc::now())).await;
        let repo = SqlxCommentRepository::new(pool.clone());

        repo.create(&Comment::new(post.id, "bob".into(), "hi".into()))
            .await
            .unwrap();
        SqlxPostRepository::new(pool.clone())
            .delete(post.id)
            .await
            .unwrap();

        assert!(repo.list_by_post(post.id).await.unwrap().is_empty());
    }
}
