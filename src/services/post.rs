//! Post service
//!
//! The post workflow:
//!
//! - **create**: resolve the category, publish now unless saved as a draft,
//!   then touch the blog.
//! - **edit**: resolve the category against the post's own blog, stamp the
//!   post as published (unless `republish_on_edit` is off), then touch the blog.
//! - **publish**: stamp `published_at = now`.
//! - **remove**: delete and report the blog to return to.
//!
//! Only a blog's author may post into it; only a post's author may change it.

use crate::config::SiteConfig;
use crate::db::repositories::{CategoryRepository, CommentRepository, PostRepository};
use crate::models::{
    category_label, Blog, Category, Comment, Page, Paginator, Post, PostInput, PostSummary, User,
};
use crate::services::blog::{BlogService, BlogServiceError};
use crate::services::category::{CategoryService, CategoryServiceError};
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

const MAX_TITLE_LEN: usize = 200;

/// Error types for post service operations
#[derive(Debug, thiserror::Error)]
pub enum PostServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The user may not change this post or blog
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<CategoryServiceError> for PostServiceError {
    fn from(err: CategoryServiceError) -> Self {
        match err {
            CategoryServiceError::NotFound(name) => {
                PostServiceError::NotFound(format!("category {}", name))
            }
            CategoryServiceError::Duplicate(msg) | CategoryServiceError::ValidationError(msg) => {
                PostServiceError::ValidationError(msg)
            }
            CategoryServiceError::InternalError(e) => PostServiceError::InternalError(e),
        }
    }
}

impl From<BlogServiceError> for PostServiceError {
    fn from(err: BlogServiceError) -> Self {
        match err {
            BlogServiceError::NotFound(id) => PostServiceError::NotFound(format!("blog {}", id)),
            BlogServiceError::ValidationError(msg) => PostServiceError::ValidationError(msg),
            BlogServiceError::InternalError(e) => PostServiceError::InternalError(e),
        }
    }
}

/// Listing sizes and edit behaviour, taken from the `site` config section
#[derive(Debug, Clone, Copy)]
pub struct PostSettings {
    pub posts_per_page: u32,
    pub front_page_posts: u32,
    pub republish_on_edit: bool,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self::from(&SiteConfig::default())
    }
}

impl From<&SiteConfig> for PostSettings {
    fn from(site: &SiteConfig) -> Self {
        Self {
            posts_per_page: site.posts_per_page,
            front_page_posts: site.front_page_posts,
            republish_on_edit: site.republish_on_edit,
        }
    }
}

/// A post with everything its detail page shows
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub blog: Blog,
    /// Category name, or "Uncategorized"
    pub category_label: String,
    pub comments: Vec<Comment>,
}

/// Post service
pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    blogs: Arc<BlogService>,
    categories: Arc<CategoryService>,
    settings: PostSettings,
}

impl PostService {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        blogs: Arc<BlogService>,
        categories: Arc<CategoryService>,
        settings: PostSettings,
    ) -> Self {
        Self {
            post_repo,
            category_repo,
            comment_repo,
            blogs,
            categories,
            settings,
        }
    }

    pub fn settings(&self) -> PostSettings {
        self.settings
    }

    /// Write a new post into `blog_id`.
    ///
    /// The post is published immediately unless `input.draft` is set. The
    /// blog's `published_at` is touched after the post is saved.
    pub async fn create(
        &self,
        blog_id: i64,
        author: &User,
        input: PostInput,
    ) -> Result<Post, PostServiceError> {
        let blog = self.blogs.get(blog_id).await?;
        if !author.is_author_of(blog.author_id) {
            return Err(PostServiceError::Forbidden(format!(
                "{} cannot post to blog {}",
                author.username, blog.id
            )));
        }

        let (title, text) = validate_input(&input)?;
        let category_id = self
            .categories
            .resolve_choice(&input.category, blog.id, author.id)
            .await?;
        self.ensure_category_in_blog(category_id, blog.id).await?;

        let mut post = Post::new(blog.id, author.id, category_id, title, text);
        if !input.draft {
            post.publish(Utc::now());
        }

        let created = self
            .post_repo
            .create(&post)
            .await
            .context("Failed to create post")?;
        self.blogs.touch(blog.id).await?;

        tracing::info!(
            post_id = created.id,
            blog_id = blog.id,
            draft = created.is_draft(),
            "Post created"
        );
        Ok(created)
    }

    /// Save an edit. With `republish_on_edit` (the default) the post ends up
    /// published whatever its previous state and whatever `input.draft` says.
    pub async fn edit(
        &self,
        post_id: i64,
        editor: &User,
        input: PostInput,
    ) -> Result<Post, PostServiceError> {
        let mut post = self.owned_post(post_id, editor).await?;

        let (title, text) = validate_input(&input)?;
        let category_id = self
            .categories
            .resolve_choice(&input.category, post.blog_id, editor.id)
            .await?;
        self.ensure_category_in_blog(category_id, post.blog_id).await?;

        post.title = title;
        post.text = text;
        post.category_id = category_id;
        if self.settings.republish_on_edit {
            post.publish(Utc::now());
        }

        let saved = self
            .post_repo
            .update(&post)
            .await
            .context("Failed to update post")?;
        if !saved {
            return Err(PostServiceError::NotFound(format!("post {}", post_id)));
        }
        self.blogs.touch(post.blog_id).await?;

        tracing::info!(post_id, draft = post.is_draft(), "Post edited");
        Ok(post)
    }

    /// Stamp a post as published now. Already published posts get a fresh
    /// timestamp.
    pub async fn publish(&self, post_id: i64, user: &User) -> Result<Post, PostServiceError> {
        let mut post = self.owned_post(post_id, user).await?;

        let now = Utc::now();
        let saved = self
            .post_repo
            .set_published_at(post.id, now)
            .await
            .context("Failed to publish post")?;
        if !saved {
            return Err(PostServiceError::NotFound(format!("post {}", post_id)));
        }
        post.publish(now);

        tracing::info!(post_id, "Post published");
        Ok(post)
    }

    /// Delete a post, returning the id of the blog it belonged to
    pub async fn remove(&self, post_id: i64, user: &User) -> Result<i64, PostServiceError> {
        let post = self.owned_post(post_id, user).await?;

        let deleted = self
            .post_repo
            .delete(post.id)
            .await
            .context("Failed to delete post")?;
        if !deleted {
            return Err(PostServiceError::NotFound(format!("post {}", post_id)));
        }

        tracing::info!(post_id, blog_id = post.blog_id, "Post removed");
        Ok(post.blog_id)
    }

    /// The most recent published posts across all blogs
    pub async fn front_page(&self) -> Result<Vec<PostSummary>, PostServiceError> {
        let posts = self
            .post_repo
            .list_recent_published(Utc::now(), self.settings.front_page_posts as i64)
            .await
            .context("Failed to list recent posts")?;
        Ok(posts)
    }

    /// One page of a blog's published posts, newest first
    pub async fn list_for_blog(
        &self,
        blog_id: i64,
        raw_page: Option<&str>,
    ) -> Result<Page<Post>, PostServiceError> {
        let blog = self.blogs.get(blog_id).await?;
        let now = Utc::now();

        let total = self
            .post_repo
            .count_published_by_blog(blog.id, now)
            .await
            .context("Failed to count posts")?;
        let paginator = Paginator::new(total.max(0) as u64, self.settings.posts_per_page);
        let number = paginator.page_number(raw_page);

        let posts = self
            .post_repo
            .list_published_by_blog(
                blog.id,
                now,
                paginator.offset(number) as i64,
                paginator.per_page() as i64,
            )
            .await
            .context("Failed to list posts")?;

        Ok(paginator.page(posts, number))
    }

    /// One page of a category's published posts, within the category's blog
    pub async fn list_for_category(
        &self,
        category_id: i64,
        raw_page: Option<&str>,
    ) -> Result<(Category, Page<Post>), PostServiceError> {
        let category = self.categories.get(category_id).await?;
        let now = Utc::now();

        let total = self
            .post_repo
            .count_published_by_category(category.blog_id, category.id, now)
            .await
            .context("Failed to count posts")?;
        let paginator = Paginator::new(total.max(0) as u64, self.settings.posts_per_page);
        let number = paginator.page_number(raw_page);

        let posts = self
            .post_repo
            .list_published_by_category(
                category.blog_id,
                category.id,
                now,
                paginator.offset(number) as i64,
                paginator.per_page() as i64,
            )
            .await
            .context("Failed to list posts")?;

        Ok((category, paginator.page(posts, number)))
    }

    /// A user's unpublished posts, oldest first
    pub async fn drafts(&self, author_id: i64) -> Result<Vec<Post>, PostServiceError> {
        let drafts = self
            .post_repo
            .list_drafts_by_author(author_id)
            .await
            .context("Failed to list drafts")?;
        Ok(drafts)
    }

    /// Get a post by ID
    pub async fn get(&self, post_id: i64) -> Result<Post, PostServiceError> {
        self.post_repo
            .get_by_id(post_id)
            .await
            .context("Failed to get post")?
            .ok_or_else(|| PostServiceError::NotFound(format!("post {}", post_id)))
    }

    /// Load a post for its detail page.
    ///
    /// Drafts are only visible to their author. A category id that does not
    /// resolve inside the post's blog is reported as not found.
    pub async fn detail(
        &self,
        post_id: i64,
        viewer: Option<&User>,
    ) -> Result<PostDetail, PostServiceError> {
        let post = self.get(post_id).await?;
        if post.is_draft() && !viewer.is_some_and(|u| u.is_author_of(post.author_id)) {
            return Err(PostServiceError::NotFound(format!("post {}", post_id)));
        }

        let blog = self.blogs.get(post.blog_id).await?;

        let category = match post.category_id {
            Some(id) => Some(self.category_in_blog(id, blog.id).await?),
            None => None,
        };

        let comments = self
            .comment_repo
            .list_by_post(post.id)
            .await
            .context("Failed to list comments")?;

        Ok(PostDetail {
            category_label: category_label(category.as_ref()).to_string(),
            post,
            blog,
            comments,
        })
    }

    async fn owned_post(&self, post_id: i64, user: &User) -> Result<Post, PostServiceError> {
        let post = self.get(post_id).await?;
        if !user.is_author_of(post.author_id) {
            return Err(PostServiceError::Forbidden(format!(
                "{} is not the author of post {}",
                user.username, post_id
            )));
        }
        Ok(post)
    }

    async fn ensure_category_in_blog(
        &self,
        category_id: Option<i64>,
        blog_id: i64,
    ) -> Result<(), PostServiceError> {
        if let Some(id) = category_id {
            self.category_in_blog(id, blog_id).await?;
        }
        Ok(())
    }

    async fn category_in_blog(
        &self,
        category_id: i64,
        blog_id: i64,
    ) -> Result<Category, PostServiceError> {
        self.category_repo
            .get_by_id(category_id)
            .await
            .context("Failed to get category")?
            .filter(|c| c.blog_id == blog_id)
            .ok_or_else(|| {
                PostServiceError::NotFound(format!(
                    "category {} in blog {}",
                    category_id, blog_id
                ))
            })
    }
}

/// Trimmed title and the text, or a validation error
fn validate_input(input: &PostInput) -> Result<(String, String), PostServiceError> {
    let title = input.title.trim();
    if title.is_empty() {
        return Err(PostServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(PostServiceError::ValidationError(format!(
            "Title cannot exceed {} characters",
            MAX_TITLE_LEN
        )));
    }
    if input.text.trim().is_empty() {
        return Err(PostServiceError::ValidationError(
            "Text cannot be empty".to_string(),
        ));
    }
    Ok((title.to_string(), input.text.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        fixtures, BlogRepository, SqlxBlogRepository, SqlxCategoryRepository,
        SqlxCommentRepository, SqlxPostRepository, SqlxUserRepository,
    };
    use crate::db::DynDatabasePool;
    use crate::models::CategoryChoice;
    use chrono::{DateTime, Duration};

    struct Harness {
        pool: DynDatabasePool,
        service: PostService,
        author: User,
        blog: Blog,
    }

    async fn setup_with(settings: PostSettings) -> Harness {
        let pool = fixtures::migrated_pool().await;
        let author = fixtures::user(&pool, "alice").await;
        let blog = fixtures::blog(&pool, author.id, "Notes").await;

        let blogs = Arc::new(BlogService::new(
            SqlxBlogRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool.clone()),
            SqlxCategoryRepository::boxed(pool.clone()),
        ));
        let categories = Arc::new(CategoryService::new(SqlxCategoryRepository::boxed(
            pool.clone(),
        )));
        let service = PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            SqlxCategoryRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool.clone()),
            blogs,
            categories,
            settings,
        );

        Harness {
            pool,
            service,
            author,
            blog,
        }
    }

    async fn setup() -> Harness {
        setup_with(PostSettings::default()).await
    }

    fn minutes_ago(n: i64) -> DateTime<Utc> {
        Utc::now() - Duration::minutes(n)
    }

    #[tokio::test]
    async fn test_create_without_draft_flag_publishes() {
        let h = setup().await;
        let before = Utc::now();

        let post = h
            .service
            .create(h.blog.id, &h.author, PostInput::new("Hello", "World"))
            .await
            .expect("Failed to create post");

        let published = post.published_at.expect("published");
        assert!(published >= before && published <= Utc::now());
        assert_eq!(post.category_id, None);
    }

    #[tokio::test]
    async fn test_create_with_draft_flag_stays_draft() {
        let h = setup().await;

        let post = h
            .service
            .create(h.blog.id, &h.author, PostInput::new("Hello", "World").as_draft())
            .await
            .unwrap();

        assert!(post.is_draft());
        assert_eq!(h.service.get(post.id).await.unwrap().published_at, None);
    }

    #[tokio::test]
    async fn test_create_touches_blog() {
        let h = setup().await;
        assert!(h.blog.published_at.is_none());

        h.service
            .create(h.blog.id, &h.author, PostInput::new("Hello", "World").as_draft())
            .await
            .unwrap();

        let blog = SqlxBlogRepository::new(h.pool.clone())
            .get_by_id(h.blog.id)
            .await
            .unwrap()
            .unwrap();
        assert!(blog.published_at.is_some());
    }

    #[tokio::test]
    async fn test_create_resolves_typed_category() {
        let h = setup().await;

        let input = PostInput::new("Hello", "World").with_category(CategoryChoice::typed("Rust"));
        let first = h.service.create(h.blog.id, &h.author, input.clone()).await.unwrap();
        let second = h.service.create(h.blog.id, &h.author, input).await.unwrap();

        assert!(first.category_id.is_some());
        assert_eq!(first.category_id, second.category_id);
    }

    #[tokio::test]
    async fn test_create_rejects_category_from_other_blog() {
        let h = setup().await;
        let other = fixtures::blog(&h.pool, h.author.id, "Other").await;
        let foreign = fixtures::category(&h.pool, other.id, "Elsewhere", h.author.id).await;

        let input =
            PostInput::new("Hello", "World").with_category(CategoryChoice::selected(foreign.id));
        let result = h.service.create(h.blog.id, &h.author, input).await;
        assert!(matches!(result, Err(PostServiceError::NotFound(_))));

        let missing = PostInput::new("Hello", "World").with_category(CategoryChoice::selected(999));
        let result = h.service.create(h.blog.id, &h.author, missing).await;
        assert!(matches!(result, Err(PostServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let h = setup().await;

        for input in [
            PostInput::new("   ", "text"),
            PostInput::new("title", "  \n "),
            PostInput::new("t".repeat(201), "text"),
        ] {
            let result = h.service.create(h.blog.id, &h.author, input).await;
            assert!(matches!(result, Err(PostServiceError::ValidationError(_))));
        }
    }

    #[tokio::test]
    async fn test_only_blog_author_can_post() {
        let h = setup().await;
        let mallory = fixtures::user(&h.pool, "mallory").await;

        let result = h
            .service
            .create(h.blog.id, &mallory, PostInput::new("Hi", "there"))
            .await;
        assert!(matches!(result, Err(PostServiceError::Forbidden(_))));

        let missing_blog = h
            .service
            .create(h.blog.id + 100, &h.author, PostInput::new("Hi", "there"))
            .await;
        assert!(matches!(missing_blog, Err(PostServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_edit_always_republishes_draft() {
        let h = setup().await;
        let draft = h
            .service
            .create(h.blog.id, &h.author, PostInput::new("Draft", "body").as_draft())
            .await
            .unwrap();

        let edited = h
            .service
            .edit(draft.id, &h.author, PostInput::new("Draft v2", "body").as_draft())
            .await
            .unwrap();

        assert!(!edited.is_draft());
        let stored = h.service.get(draft.id).await.unwrap();
        assert_eq!(stored.title, "Draft v2");
        assert!(stored.published_at.is_some());
        assert_eq!(stored.created_at, draft.created_at);
    }

    #[tokio::test]
    async fn test_edit_refreshes_publication_time() {
        let h = setup().await;
        let old = fixtures::post(&h.pool, &h.blog, "Old", minutes_ago(60), Some(minutes_ago(60)))
            .await;

        let edited = h
            .service
            .edit(old.id, &h.author, PostInput::new("Old", "new body"))
            .await
            .unwrap();

        assert!(edited.published_at.unwrap() > old.published_at.unwrap());
    }

    #[tokio::test]
    async fn test_edit_preserves_state_when_republish_disabled() {
        let h = setup_with(PostSettings {
            republish_on_edit: false,
            ..PostSettings::default()
        })
        .await;
        let draft = fixtures::post(&h.pool, &h.blog, "Draft", minutes_ago(5), None).await;
        let live =
            fixtures::post(&h.pool, &h.blog, "Live", minutes_ago(60), Some(minutes_ago(60))).await;

        let draft_edit = h
            .service
            .edit(draft.id, &h.author, PostInput::new("Draft", "edited"))
            .await
            .unwrap();
        assert!(draft_edit.is_draft());

        let live_edit = h
            .service
            .edit(live.id, &h.author, PostInput::new("Live", "edited"))
            .await
            .unwrap();
        assert_eq!(live_edit.published_at, live.published_at);
    }

    #[tokio::test]
    async fn test_edit_resolves_category_in_post_blog() {
        let h = setup().await;
        let post = fixtures::post(&h.pool, &h.blog, "Post", minutes_ago(5), None).await;

        let edited = h
            .service
            .edit(
                post.id,
                &h.author,
                PostInput::new("Post", "body").with_category(CategoryChoice::typed("Travel")),
            )
            .await
            .unwrap();

        let category = SqlxCategoryRepository::new(h.pool.clone())
            .get_by_id(edited.category_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(category.blog_id, h.blog.id);
        assert_eq!(category.category_name, "Travel");
    }

    #[tokio::test]
    async fn test_only_post_author_can_change_it() {
        let h = setup().await;
        let mallory = fixtures::user(&h.pool, "mallory").await;
        let post = fixtures::post(&h.pool, &h.blog, "Mine", minutes_ago(5), None).await;

        let edit = h.service.edit(post.id, &mallory, PostInput::new("x", "y")).await;
        assert!(matches!(edit, Err(PostServiceError::Forbidden(_))));
        assert!(matches!(
            h.service.publish(post.id, &mallory).await,
            Err(PostServiceError::Forbidden(_))
        ));
        assert!(matches!(
            h.service.remove(post.id, &mallory).await,
            Err(PostServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_publish_draft_and_republish() {
        let h = setup().await;
        let draft = fixtures::post(&h.pool, &h.blog, "Draft", minutes_ago(5), None).await;

        let published = h.service.publish(draft.id, &h.author).await.unwrap();
        let first = published.published_at.unwrap();
        assert_eq!(published.title, "Draft");
        assert_eq!(published.category_id, draft.category_id);

        let again = h.service.publish(draft.id, &h.author).await.unwrap();
        assert!(again.published_at.unwrap() >= first);

        assert!(matches!(
            h.service.publish(draft.id + 100, &h.author).await,
            Err(PostServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_returns_blog_and_hides_post() {
        let h = setup().await;
        let post =
            fixtures::post(&h.pool, &h.blog, "Bye", minutes_ago(5), Some(minutes_ago(5))).await;

        let blog_id = h.service.remove(post.id, &h.author).await.unwrap();
        assert_eq!(blog_id, h.blog.id);

        let page = h.service.list_for_blog(h.blog.id, None).await.unwrap();
        assert!(page.items.iter().all(|p| p.id != post.id));
        assert!(matches!(
            h.service.get(post.id).await,
            Err(PostServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_blog_listing_pages() {
        let h = setup().await;
        for i in 1..=12 {
            // Post i is older than post i+1
            let at = minutes_ago(100 - i);
            fixtures::post(&h.pool, &h.blog, &format!("post {}", i), at, Some(at)).await;
        }
        fixtures::post(&h.pool, &h.blog, "draft", minutes_ago(1), None).await;

        let first = h.service.list_for_blog(h.blog.id, None).await.unwrap();
        assert_eq!(first.number, 1);
        assert_eq!(first.num_pages, 2);
        assert_eq!(first.total, 12);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].title, "post 12");

        let second = h.service.list_for_blog(h.blog.id, Some("2")).await.unwrap();
        let titles: Vec<&str> = second.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["post 2", "post 1"]);

        let garbage = h.service.list_for_blog(h.blog.id, Some("abc")).await.unwrap();
        assert_eq!(garbage.number, 1);

        let beyond = h.service.list_for_blog(h.blog.id, Some("999")).await.unwrap();
        assert_eq!(beyond.number, 2);
        assert_eq!(beyond.items.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_blog_has_one_empty_page() {
        let h = setup().await;

        let page = h.service.list_for_blog(h.blog.id, Some("5")).await.unwrap();
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.items.is_empty());

        assert!(matches!(
            h.service.list_for_blog(h.blog.id + 1, None).await,
            Err(PostServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_category_listing() {
        let h = setup().await;
        let rust = h
            .service
            .create(
                h.blog.id,
                &h.author,
                PostInput::new("In Rust", "x").with_category(CategoryChoice::typed("Rust")),
            )
            .await
            .unwrap();
        h.service
            .create(
                h.blog.id,
                &h.author,
                PostInput::new("Rust draft", "x")
                    .with_category(CategoryChoice::typed("Rust"))
                    .as_draft(),
            )
            .await
            .unwrap();
        h.service
            .create(h.blog.id, &h.author, PostInput::new("Plain", "x"))
            .await
            .unwrap();

        let category_id = rust.category_id.unwrap();
        let (category, page) = h.service.list_for_category(category_id, None).await.unwrap();

        assert_eq!(category.category_name, "Rust");
        assert_eq!(category.blog_id, h.blog.id);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, rust.id);

        assert!(matches!(
            h.service.list_for_category(category_id + 50, None).await,
            Err(PostServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_front_page_shows_five_newest_published() {
        let h = setup().await;
        for i in 1..=7 {
            let at = minutes_ago(100 - i);
            fixtures::post(&h.pool, &h.blog, &format!("post {}", i), at, Some(at)).await;
        }
        fixtures::post(&h.pool, &h.blog, "draft", minutes_ago(0), None).await;

        let front = h.service.front_page().await.unwrap();
        let titles: Vec<&str> = front.iter().map(|s| s.post.title.as_str()).collect();
        assert_eq!(titles, vec!["post 7", "post 6", "post 5", "post 4", "post 3"]);
        assert!(front.iter().all(|s| s.blog_title == "Notes"));
    }

    #[tokio::test]
    async fn test_drafts_oldest_first() {
        let h = setup().await;
        fixtures::post(&h.pool, &h.blog, "newer", minutes_ago(1), None).await;
        fixtures::post(&h.pool, &h.blog, "older", minutes_ago(10), None).await;
        fixtures::post(&h.pool, &h.blog, "live", minutes_ago(20), Some(minutes_ago(20))).await;

        let titles: Vec<String> = h
            .service
            .drafts(h.author.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["older", "newer"]);
    }

    #[tokio::test]
    async fn test_detail_labels_and_comments() {
        let h = setup().await;
        let plain = h
            .service
            .create(h.blog.id, &h.author, PostInput::new("Plain", "text"))
            .await
            .unwrap();
        let tagged = h
            .service
            .create(
                h.blog.id,
                &h.author,
                PostInput::new("Tagged", "text").with_category(CategoryChoice::typed("Rust")),
            )
            .await
            .unwrap();
        SqlxCommentRepository::new(h.pool.clone())
            .create(&Comment::new(plain.id, "bob".into(), "nice".into()))
            .await
            .unwrap();

        let detail = h.service.detail(plain.id, None).await.unwrap();
        assert_eq!(detail.category_label, "Uncategorized");
        assert_eq!(detail.blog.id, h.blog.id);
        assert_eq!(detail.comments.len(), 1);

        let detail = h.service.detail(tagged.id, None).await.unwrap();
        assert_eq!(detail.category_label, "Rust");
    }

    #[tokio::test]
    async fn test_detail_of_draft_only_for_author() {
        let h = setup().await;
        let mallory = fixtures::user(&h.pool, "mallory").await;
        let draft = fixtures::post(&h.pool, &h.blog, "Secret", minutes_ago(1), None).await;

        assert!(matches!(
            h.service.detail(draft.id, None).await,
            Err(PostServiceError::NotFound(_))
        ));
        assert!(matches!(
            h.service.detail(draft.id, Some(&mallory)).await,
            Err(PostServiceError::NotFound(_))
        ));
        assert!(h.service.detail(draft.id, Some(&h.author)).await.is_ok());
    }

    #[tokio::test]
    async fn test_detail_with_foreign_category_is_not_found() {
        let h = setup().await;
        let other = fixtures::blog(&h.pool, h.author.id, "Other").await;
        let foreign = fixtures::category(&h.pool, other.id, "Elsewhere", h.author.id).await;

        let mut post =
            fixtures::post(&h.pool, &h.blog, "Odd", minutes_ago(1), Some(minutes_ago(1))).await;
        post.category_id = Some(foreign.id);
        SqlxPostRepository::new(h.pool.clone()).update(&post).await.unwrap();

        assert!(matches!(
            h.service.detail(post.id, None).await,
            Err(PostServiceError::NotFound(_))
        ));
    }
}
