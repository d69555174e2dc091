//! Test fixtures shared by repository and service tests

use chrono::{DateTime, Utc};

use super::{
    BlogRepository, CategoryRepository, PostRepository, SqlxBlogRepository,
    SqlxCategoryRepository, SqlxPostRepository, SqlxUserRepository, UserRepository,
};
use crate::db::{create_test_pool, migrations, DynDatabasePool};
use crate::models::{Blog, Category, Post, User};

pub async fn migrated_pool() -> DynDatabasePool {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

pub async fn user(pool: &DynDatabasePool, username: &str) -> User {
    let user = User::new(
        username.to_string(),
        format!("{}@example.com", username),
        "hash".to_string(),
    );
    SqlxUserRepository::new(pool.clone())
        .create(&user)
        .await
        .expect("Failed to create user")
}

pub async fn blog(pool: &DynDatabasePool, author_id: i64, title: &str) -> Blog {
    SqlxBlogRepository::new(pool.clone())
        .create(&Blog::new(author_id, title.to_string(), None))
        .await
        .expect("Failed to create blog")
}

pub async fn category(pool: &DynDatabasePool, blog_id: i64, name: &str, holder_id: i64) -> Category {
    SqlxCategoryRepository::new(pool.clone())
        .create(&Category::new(blog_id, name.to_string(), holder_id))
        .await
        .expect("Failed to create category")
}

/// Insert a post with explicit timestamps so ordering is deterministic
pub async fn post(
    pool: &DynDatabasePool,
    blog: &Blog,
    title: &str,
    created_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
) -> Post {
    let mut post = Post::new(
        blog.id,
        blog.author_id,
        None,
        title.to_string(),
        format!("Body of {}", title),
    );
    post.created_at = created_at;
    post.published_at = published_at;
    SqlxPostRepository::new(pool.clone())
        .create(&post)
        .await
        .expect("Failed to create post")
}
