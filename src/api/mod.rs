//! Web layer - HTML handlers and routing
//!
//! Pages:
//! - front page, blog and category listings, article pages
//! - post authoring (create, edit, publish, remove, drafts)
//! - sign-up, blog settings, login and logout
//! - comments
//! - embedded static assets

pub mod auth;
pub mod blogs;
pub mod comments;
pub mod error;
pub mod middleware;
pub mod posts;
pub mod static_files;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub use error::{WebError, WebResult};
pub use middleware::{AppState, AuthenticatedUser, MaybeUser};

/// Routes that need a logged-in user
fn protected_router() -> Router<AppState> {
    Router::new()
        .route(
            "/create/{id}/",
            get(posts::create_form).post(posts::create_submit),
        )
        .route("/{id}/edit/", get(posts::edit_form).post(posts::edit_submit))
        .route("/post/{id}/publish/", get(posts::publish).post(posts::publish))
        .route("/post/{id}/remove/", get(posts::remove).post(posts::remove))
        .route("/drafts/", get(posts::drafts))
        .route(
            "/signup/settings/",
            get(blogs::settings_form).post(blogs::settings_submit),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_auth))
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(posts::index))
        .route("/{id}/", get(posts::blog_posts))
        .route("/category/{id}", get(posts::category_posts))
        .route("/article/{id}/", get(posts::post_detail))
        .route("/article/{id}/comment/", post(comments::create_comment))
        .route("/signup/new/", get(auth::signup_form).post(auth::signup_submit))
        .route("/login/", get(auth::login_form).post(auth::login_submit))
        .route("/logout/", get(auth::logout).post(auth::logout))
        .route("/static/{*path}", get(static_files::serve_static))
        .merge(protected_router())
        .fallback(not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::render_error_pages,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::load_user,
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> WebError {
    WebError::NotFound("no such route".to_string())
}
