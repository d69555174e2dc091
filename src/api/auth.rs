//! Sign-up, login and logout
//!
//! The session token lives in an `HttpOnly` cookie named `session`.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};
use tera::Context as TeraContext;

use crate::api::error::WebResult;
use crate::api::middleware::{
    clear_session_cookie, extract_session_token, AppState, MaybeUser,
};
use crate::models::{LoginInput, RegisterInput};
use crate::services::UserServiceError;

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up values echoed back; never the password
#[derive(Debug, Default, Serialize)]
struct SignupView<'a> {
    username: &'a str,
    email: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username_or_email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

/// Only same-site absolute paths are followed after login
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') =>
        {
            path
        }
        _ => "/",
    }
}

/// `GET /signup/new/`
pub async fn signup_form(
    State(state): State<AppState>,
    user: MaybeUser,
    uri: Uri,
) -> Html<String> {
    render_signup(&state, uri.path(), &user, &SignupView::default(), None)
}

/// `POST /signup/new/`
pub async fn signup_submit(
    State(state): State<AppState>,
    user: MaybeUser,
    uri: Uri,
    Form(form): Form<SignupForm>,
) -> WebResult<Response> {
    let input = RegisterInput {
        username: form.username.clone(),
        email: form.email.clone(),
        password: form.password.clone(),
    };

    match state.user_service.register(input).await {
        Ok(new_user) => {
            let session = state.user_service.start_session(new_user.id).await?;
            tracing::info!(user_id = new_user.id, "User signed up");
            Ok((
                [(header::SET_COOKIE, state.session_cookie(&session.id))],
                Redirect::to("/signup/settings/"),
            )
                .into_response())
        }
        Err(UserServiceError::ValidationError(msg)) | Err(UserServiceError::Duplicate(msg)) => {
            let view = SignupView {
                username: &form.username,
                email: &form.email,
            };
            let page = render_signup(&state, uri.path(), &user, &view, Some(&msg));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

fn render_signup(
    state: &AppState,
    path: &str,
    user: &MaybeUser,
    form: &SignupView<'_>,
    error: Option<&str>,
) -> Html<String> {
    let mut context = TeraContext::new();
    context.insert("form", form);
    context.insert("error", &error);
    state.render("signup.html", &context, path, user.user())
}

/// `GET /login/`
pub async fn login_form(
    State(state): State<AppState>,
    user: MaybeUser,
    uri: Uri,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    let next = safe_next(query.next.as_deref());
    render_login(&state, uri.path(), &user, next, "", None)
}

/// `POST /login/`
pub async fn login_submit(
    State(state): State<AppState>,
    user: MaybeUser,
    uri: Uri,
    Form(form): Form<LoginForm>,
) -> WebResult<Response> {
    let next = safe_next(Some(form.next.as_str())).to_string();
    let input = LoginInput {
        username_or_email: form.username_or_email.clone(),
        password: form.password,
    };

    match state.user_service.login(input).await {
        Ok(session) => Ok((
            [(header::SET_COOKIE, state.session_cookie(&session.id))],
            Redirect::to(&next),
        )
            .into_response()),
        Err(UserServiceError::AuthenticationError(msg))
        | Err(UserServiceError::ValidationError(msg)) => {
            let page = render_login(
                &state,
                uri.path(),
                &user,
                &next,
                &form.username_or_email,
                Some(&msg),
            );
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

fn render_login(
    state: &AppState,
    path: &str,
    user: &MaybeUser,
    next: &str,
    username_or_email: &str,
    error: Option<&str>,
) -> Html<String> {
    let mut context = TeraContext::new();
    context.insert("next", next);
    context.insert("username_or_email", username_or_email);
    context.insert("error", &error);
    state.render("login.html", &context, path, user.user())
}

/// `GET|POST /logout/`
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = extract_session_token(&headers) {
        if let Err(e) = state.user_service.logout(&token).await {
            tracing::warn!("Failed to end session: {}", e);
        }
    }

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_accepts_local_paths() {
        assert_eq!(safe_next(Some("/create/3/")), "/create/3/");
        assert_eq!(safe_next(Some("/drafts/?x=1")), "/drafts/?x=1");
    }

    #[test]
    fn test_safe_next_rejects_other_sites() {
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(Some("")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
