//! Post pages
//!
//! Front page, blog and category listings, the article page, and the
//! author-only create/edit/publish/remove/drafts actions. Every route names
//! the blog or post it acts on; nothing is carried between requests.

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;

use crate::api::comments::CommentFormView;
use crate::api::error::{WebError, WebResult};
use crate::api::middleware::{AppState, AuthenticatedUser, MaybeUser};
use crate::models::{Blog, BlogContext, Category, CategoryChoice, Page, Post, PostInput, User};
use crate::services::PostServiceError;

const EXCERPT_CHARS: usize = 300;

/// `?page=` as typed by the visitor; parsed leniently by the paginator
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Submitted post form
#[derive(Debug, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    /// Selected category id; empty means uncategorized
    #[serde(default)]
    pub category_id: String,
    /// Newly typed category name, takes precedence over the selection
    #[serde(default)]
    pub category_name: String,
    /// Checkbox, present only when ticked
    pub draft: Option<String>,
}

impl PostForm {
    pub fn to_input(&self) -> Result<PostInput, String> {
        let selected_id = match self.category_id.trim() {
            "" => None,
            raw => Some(
                raw.parse::<i64>()
                    .map_err(|_| "Invalid category".to_string())?,
            ),
        };
        let category = CategoryChoice {
            typed_name: Some(self.category_name.clone()).filter(|name| !name.trim().is_empty()),
            selected_id,
        };

        let mut input = PostInput::new(self.title.clone(), self.text.clone()).with_category(category);
        if self.draft.is_some() {
            input = input.as_draft();
        }
        Ok(input)
    }

    fn view(&self) -> PostFormView {
        PostFormView {
            title: self.title.clone(),
            text: self.text.clone(),
            category_id: self.category_id.trim().parse().ok(),
            category_name: self.category_name.clone(),
            draft: self.draft.is_some(),
        }
    }
}

/// Values shown in the post form
#[derive(Debug, Default, Serialize)]
pub struct PostFormView {
    pub title: String,
    pub text: String,
    pub category_id: Option<i64>,
    pub category_name: String,
    pub draft: bool,
}

impl From<&Post> for PostFormView {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            category_id: post.category_id,
            category_name: String::new(),
            draft: post.is_draft(),
        }
    }
}

/// A post in a listing, with its plain-text excerpt
#[derive(Debug, Serialize)]
struct ListedPost {
    #[serde(flatten)]
    post: Post,
    excerpt: String,
}

/// `GET /`
pub async fn index(
    State(state): State<AppState>,
    user: MaybeUser,
    uri: Uri,
) -> WebResult<Html<String>> {
    let posts = state.post_service.front_page().await?;

    let mut context = TeraContext::new();
    context.insert("posts", &posts);
    match user.user() {
        Some(user) => {
            let blog_count = state.blog_service.count_by_author(user.id).await?;
            let blogs = state.blog_service.list_by_author(user.id).await?;
            context.insert("blog_count", &blog_count);
            context.insert("my_blogs", &blogs);
        }
        None => {
            context.insert("blog_count", &0);
            context.insert("my_blogs", &Vec::<Blog>::new());
        }
    }

    Ok(state.render("index.html", &context, uri.path(), user.user()))
}

/// `GET /{blog_id}/`
pub async fn blog_posts(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(blog_id): Path<i64>,
    Query(query): Query<PageQuery>,
    uri: Uri,
) -> WebResult<Html<String>> {
    let blog = state.blog_service.load_context(blog_id).await?;
    let page = state
        .post_service
        .list_for_blog(blog_id, query.page.as_deref())
        .await?;

    let context = listing_context(&state, &blog, None, page, &format!("/{}/", blog_id));
    Ok(state.render("post_list.html", &context, uri.path(), user.user()))
}

/// `GET /category/{category_id}`
pub async fn category_posts(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(category_id): Path<i64>,
    Query(query): Query<PageQuery>,
    uri: Uri,
) -> WebResult<Html<String>> {
    let (category, page) = state
        .post_service
        .list_for_category(category_id, query.page.as_deref())
        .await?;
    let blog = state.blog_service.load_context(category.blog_id).await?;

    let context = listing_context(
        &state,
        &blog,
        Some(&category),
        page,
        &format!("/category/{}", category_id),
    );
    Ok(state.render("post_list.html", &context, uri.path(), user.user()))
}

fn listing_context(
    state: &AppState,
    blog: &BlogContext,
    category: Option<&Category>,
    page: Page<Post>,
    page_base: &str,
) -> TeraContext {
    let page = page.map(|post| ListedPost {
        excerpt: state.markdown.excerpt(&post.text, EXCERPT_CHARS),
        post,
    });

    let mut context = TeraContext::new();
    context.insert("blog", &blog.blog);
    context.insert("owner", &blog.owner);
    context.insert("categories", &blog.categories);
    context.insert("category", &category);
    context.insert("page", &page);
    context.insert("page_base", page_base);
    context
}

/// `GET /article/{post_id}/`
pub async fn post_detail(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(post_id): Path<i64>,
    uri: Uri,
) -> WebResult<Html<String>> {
    render_detail(
        &state,
        uri.path(),
        user.user(),
        post_id,
        &CommentFormView::default(),
        None,
    )
    .await
}

/// Render the article page, optionally with a rejected comment form
pub(crate) async fn render_detail(
    state: &AppState,
    path: &str,
    user: Option<&User>,
    post_id: i64,
    comment_form: &CommentFormView,
    error: Option<&str>,
) -> WebResult<Html<String>> {
    let detail = state.post_service.detail(post_id, user).await?;
    let body_html = state.markdown.render(&detail.post.text);

    let mut context = TeraContext::new();
    context.insert("post", &detail.post);
    context.insert("blog", &detail.blog);
    context.insert("category_label", &detail.category_label);
    context.insert("comments", &detail.comments);
    context.insert("body_html", &body_html);
    context.insert("comment_form", comment_form);
    context.insert("error", &error);

    Ok(state.render("post_detail.html", &context, path, user))
}

/// `GET /create/{blog_id}/`
pub async fn create_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(blog_id): Path<i64>,
    uri: Uri,
) -> WebResult<Html<String>> {
    let blog = owned_blog(&state, blog_id, &user).await?;
    let view = PostFormView::default();
    post_form_page(&state, uri.path(), &user, &blog, false, &view, None).await
}

/// `POST /create/{blog_id}/`
pub async fn create_submit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(blog_id): Path<i64>,
    uri: Uri,
    Form(form): Form<PostForm>,
) -> WebResult<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(msg) => {
            let blog = owned_blog(&state, blog_id, &user).await?;
            return rejected_form(&state, uri.path(), &user, &blog, false, &form, &msg).await;
        }
    };

    match state.post_service.create(blog_id, &user, input).await {
        Ok(_) => Ok(Redirect::to(&format!("/{}/", blog_id)).into_response()),
        Err(PostServiceError::ValidationError(msg)) => {
            let blog = owned_blog(&state, blog_id, &user).await?;
            rejected_form(&state, uri.path(), &user, &blog, false, &form, &msg).await
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET /{post_id}/edit/`
pub async fn edit_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(post_id): Path<i64>,
    uri: Uri,
) -> WebResult<Html<String>> {
    let (post, blog) = owned_post(&state, post_id, &user).await?;
    let view = PostFormView::from(&post);
    post_form_page(&state, uri.path(), &user, &blog, true, &view, None).await
}

/// `POST /{post_id}/edit/`
pub async fn edit_submit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(post_id): Path<i64>,
    uri: Uri,
    Form(form): Form<PostForm>,
) -> WebResult<Response> {
    let input = match form.to_input() {
        Ok(input) => input,
        Err(msg) => {
            let (_, blog) = owned_post(&state, post_id, &user).await?;
            return rejected_form(&state, uri.path(), &user, &blog, true, &form, &msg).await;
        }
    };

    match state.post_service.edit(post_id, &user, input).await {
        Ok(post) => Ok(Redirect::to(&format!("/article/{}/", post.id)).into_response()),
        Err(PostServiceError::ValidationError(msg)) => {
            let (_, blog) = owned_post(&state, post_id, &user).await?;
            rejected_form(&state, uri.path(), &user, &blog, true, &form, &msg).await
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET|POST /post/{post_id}/publish/`
pub async fn publish(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> WebResult<Redirect> {
    let post = state.post_service.publish(post_id, &user).await?;
    Ok(Redirect::to(&format!("/article/{}/", post.id)))
}

/// `GET|POST /post/{post_id}/remove/`
pub async fn remove(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> WebResult<Redirect> {
    let blog_id = state.post_service.remove(post_id, &user).await?;
    Ok(Redirect::to(&format!("/{}/", blog_id)))
}

/// `GET /drafts/`
pub async fn drafts(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    uri: Uri,
) -> WebResult<Html<String>> {
    let posts = state.post_service.drafts(user.id).await?;

    let mut context = TeraContext::new();
    context.insert("posts", &posts);
    Ok(state.render("post_draft_list.html", &context, uri.path(), Some(&user)))
}

/// The blog, if `user` may post into it
async fn owned_blog(state: &AppState, blog_id: i64, user: &User) -> WebResult<Blog> {
    let blog = state.blog_service.get(blog_id).await?;
    if !user.is_author_of(blog.author_id) {
        return Err(WebError::Forbidden(format!(
            "user {} does not own blog {}",
            user.id, blog_id
        )));
    }
    Ok(blog)
}

/// The post and its blog, if `user` wrote the post
async fn owned_post(state: &AppState, post_id: i64, user: &User) -> WebResult<(Post, Blog)> {
    let post = state.post_service.get(post_id).await?;
    if !user.is_author_of(post.author_id) {
        return Err(WebError::Forbidden(format!(
            "user {} did not write post {}",
            user.id, post_id
        )));
    }
    let blog = state.blog_service.get(post.blog_id).await?;
    Ok((post, blog))
}

async fn post_form_page(
    state: &AppState,
    path: &str,
    user: &User,
    blog: &Blog,
    editing: bool,
    form: &PostFormView,
    error: Option<&str>,
) -> WebResult<Html<String>> {
    let categories = state.category_service.list_for_blog(blog.id).await?;

    let mut context = TeraContext::new();
    context.insert("editing", &editing);
    context.insert("blog", blog);
    context.insert("categories", &categories);
    context.insert("action", path);
    context.insert("form", form);
    context.insert("error", &error);
    Ok(state.render("post_edit.html", &context, path, Some(user)))
}

/// Re-render a submitted form with its values and the validation message
async fn rejected_form(
    state: &AppState,
    path: &str,
    user: &User,
    blog: &Blog,
    editing: bool,
    form: &PostForm,
    message: &str,
) -> WebResult<Response> {
    let page = post_form_page(state, path, user, blog, editing, &form.view(), Some(message)).await?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(category_id: &str, category_name: &str, draft: bool) -> PostForm {
        PostForm {
            title: "Title".into(),
            text: "Body".into(),
            category_id: category_id.into(),
            category_name: category_name.into(),
            draft: draft.then(|| "on".to_string()),
        }
    }

    #[test]
    fn test_form_without_category() {
        let input = form("", "", false).to_input().unwrap();
        assert_eq!(input.category, CategoryChoice::none());
        assert!(!input.draft);
    }

    #[test]
    fn test_form_with_selected_and_typed_category() {
        let input = form("4", "  Rust ", true).to_input().unwrap();
        assert_eq!(input.category.selected_id, Some(4));
        assert_eq!(input.category.typed_name(), Some("Rust"));
        assert!(input.draft);
    }

    #[test]
    fn test_form_blank_typed_name_is_ignored() {
        let input = form("2", "   ", false).to_input().unwrap();
        assert_eq!(input.category, CategoryChoice::selected(2));
    }

    #[test]
    fn test_form_rejects_garbage_category_id() {
        assert!(form("abc", "", false).to_input().is_err());
    }

    #[test]
    fn test_form_view_keeps_submitted_values() {
        let view = form("7", "new", true).view();
        assert_eq!(view.category_id, Some(7));
        assert_eq!(view.category_name, "new");
        assert!(view.draft);
    }

    #[test]
    fn test_form_view_of_draft_post() {
        let post = Post::new(1, 2, None, "Draft".into(), "text".into());
        let view = PostFormView::from(&post);
        assert!(view.draft);
        assert_eq!(view.title, "Draft");
    }
}
