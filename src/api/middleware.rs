//! Request middleware and shared state
//!
//! Contains:
//! - `AppState`, the services every handler works through
//! - session loading (`load_user`) and the login gate (`require_auth`)
//! - extractors for the current user
//! - themed error pages (`render_error_pages`)

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::convert::Infallible;
use std::sync::Arc;
use tera::Context as TeraContext;

use crate::api::error::ErrorPage;
use crate::config::Config;
use crate::db::repositories::{
    SqlxBlogRepository, SqlxCategoryRepository, SqlxCommentRepository, SqlxPostRepository,
    SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{
    BlogService, CategoryService, CommentService, MarkdownRenderer, PostService, PostSettings,
    UserService,
};
use crate::theme::{StandardTemplateVars, ThemeEngine};

pub const SESSION_COOKIE: &str = "session";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub config: Arc<Config>,
    pub user_service: Arc<UserService>,
    pub blog_service: Arc<BlogService>,
    pub category_service: Arc<CategoryService>,
    pub post_service: Arc<PostService>,
    pub comment_service: Arc<CommentService>,
    pub theme_engine: Arc<ThemeEngine>,
    pub markdown: MarkdownRenderer,
}

impl AppState {
    /// Wire repositories and services over `pool`
    pub fn new(pool: DynDatabasePool, config: Config, theme_engine: ThemeEngine) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = Arc::new(SqlxSessionRepository::new(pool.clone()));
        let blog_repo = SqlxBlogRepository::boxed(pool.clone());
        let category_repo = Arc::new(SqlxCategoryRepository::new(pool.clone()));
        let post_repo = Arc::new(SqlxPostRepository::new(pool.clone()));
        let comment_repo = Arc::new(SqlxCommentRepository::new(pool.clone()));

        let user_service = Arc::new(UserService::with_session_lifetime(
            user_repo.clone(),
            session_repo,
            config.session.lifetime_days,
        ));
        let category_service = Arc::new(CategoryService::new(category_repo.clone()));
        let blog_service = Arc::new(BlogService::new(blog_repo, user_repo, category_repo.clone()));
        let post_service = Arc::new(PostService::new(
            post_repo.clone(),
            category_repo,
            comment_repo.clone(),
            blog_service.clone(),
            category_service.clone(),
            PostSettings::from(&config.site),
        ));
        let comment_service = Arc::new(CommentService::new(comment_repo, post_repo));

        Self {
            pool,
            config: Arc::new(config),
            user_service,
            blog_service,
            category_service,
            post_service,
            comment_service,
            theme_engine: Arc::new(theme_engine),
            markdown: MarkdownRenderer::new(),
        }
    }

    /// Render a page with the standard template variables
    pub fn render(
        &self,
        template: &str,
        context: &TeraContext,
        path: &str,
        user: Option<&User>,
    ) -> Html<String> {
        let vars = StandardTemplateVars::new(self.config.site.name.clone(), path).with_user(user);
        Html(self.theme_engine.render_page(template, context, &vars))
    }

    /// `Set-Cookie` value for a freshly started session
    pub fn session_cookie(&self, token: &str) -> String {
        let max_age = self.config.session.lifetime_days.saturating_mul(24 * 60 * 60);
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE, token, max_age
        );
        if self.config.session.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Logged-in user, placed in request extensions by [`load_user`].
///
/// As an extractor it redirects anonymous requests to the login page.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// The logged-in user, if any
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| login_redirect(parts.uri.path_and_query().map(|pq| pq.as_str())))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|user| user.0.clone()),
        ))
    }
}

/// Redirect to the login form, returning to `next` afterwards
pub fn login_redirect(next: Option<&str>) -> Redirect {
    match next {
        Some(next) => Redirect::to(&format!("/login/?next={}", urlencoding::encode(next))),
        None => Redirect::to("/login/"),
    }
}

/// Extract the session token from the `Cookie` header
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            let (name, value) = cookie.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
}

/// Resolve the session cookie to a user for every request.
///
/// Session lookup failures are logged and the request continues anonymously.
pub async fn load_user(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if let Some(token) = extract_session_token(request.headers()) {
        match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(AuthenticatedUser(user));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Session validation failed: {}", e),
        }
    }
    next.run(request).await
}

/// Login gate for routes that need a user
pub async fn require_auth(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        let next_path = request.uri().path_and_query().map(|pq| pq.as_str());
        return login_redirect(next_path).into_response();
    }
    next.run(request).await
}

/// Replace the plain body of error responses with the theme's `error.html`
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.0.clone());

    let response = next.run(request).await;
    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };

    let mut context = TeraContext::new();
    context.insert("status", &page.status.as_u16());
    context.insert("message", &page.message);
    let body = state.render("error.html", &context, &path, user.as_ref());

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, body.into_response().into_body())
}
