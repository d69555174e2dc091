//! Web-layer errors
//!
//! Every service error is converted into a [`WebError`], which renders as a
//! plain HTML page and tags the response with an [`ErrorPage`] extension.
//! The `render_error_pages` middleware swaps that body for the theme's
//! `error.html`.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::services::{
    BlogServiceError, CategoryServiceError, CommentServiceError, PostServiceError,
    UserServiceError,
};
use crate::theme::ThemeEngine;

const INTERNAL_MESSAGE: &str = "Something went wrong on our side.";

/// Marker left on error responses for the themed error page
#[derive(Debug, Clone)]
pub struct ErrorPage {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Invalid input outside of a form that can be re-rendered
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Forbidden(_) => StatusCode::FORBIDDEN,
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the visitor; internal details stay in the log
    fn public_message(&self) -> String {
        match self {
            WebError::NotFound(_) => "The page you are looking for does not exist.".to_string(),
            WebError::Forbidden(_) => "You are not allowed to do that.".to_string(),
            WebError::BadRequest(msg) => msg.clone(),
            WebError::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            WebError::Internal(e) => tracing::error!("Request failed: {:#}", e),
            other => tracing::debug!("{}", other),
        }

        let message = self.public_message();
        let body = ThemeEngine::simple_error_page(status.as_u16(), &message);
        let mut response = (
            status,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response();
        response
            .extensions_mut()
            .insert(ErrorPage { status, message });
        response
    }
}

impl From<PostServiceError> for WebError {
    fn from(err: PostServiceError) -> Self {
        match err {
            PostServiceError::NotFound(what) => WebError::NotFound(what),
            PostServiceError::Forbidden(msg) => WebError::Forbidden(msg),
            PostServiceError::ValidationError(msg) => WebError::BadRequest(msg),
            PostServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<BlogServiceError> for WebError {
    fn from(err: BlogServiceError) -> Self {
        match err {
            BlogServiceError::NotFound(id) => WebError::NotFound(format!("blog {}", id)),
            BlogServiceError::ValidationError(msg) => WebError::BadRequest(msg),
            BlogServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<CategoryServiceError> for WebError {
    fn from(err: CategoryServiceError) -> Self {
        match err {
            CategoryServiceError::NotFound(what) => WebError::NotFound(format!("category {}", what)),
            CategoryServiceError::Duplicate(msg) | CategoryServiceError::ValidationError(msg) => {
                WebError::BadRequest(msg)
            }
            CategoryServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<CommentServiceError> for WebError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::NotFound(id) => WebError::NotFound(format!("post {}", id)),
            CommentServiceError::ValidationError(msg) => WebError::BadRequest(msg),
            CommentServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<UserServiceError> for WebError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::NotFound(id) => WebError::NotFound(format!("user {}", id)),
            UserServiceError::AuthenticationError(msg) => WebError::Forbidden(msg),
            UserServiceError::ValidationError(msg) | UserServiceError::Duplicate(msg) => {
                WebError::BadRequest(msg)
            }
            UserServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

pub type WebResult<T> = Result<T, WebError>;
