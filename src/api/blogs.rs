//! Blog settings: starting a new blog

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use tera::Context as TeraContext;

use crate::api::error::WebResult;
use crate::api::middleware::{AppState, AuthenticatedUser};
use crate::models::{BlogInput, User};
use crate::services::BlogServiceError;

/// `GET /signup/settings/`
pub async fn settings_form(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    uri: Uri,
) -> WebResult<Html<String>> {
    render_settings(&state, uri.path(), &user, &BlogInput::default(), None).await
}

/// `POST /signup/settings/`
pub async fn settings_submit(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    uri: Uri,
    Form(form): Form<BlogInput>,
) -> WebResult<Response> {
    match state.blog_service.create(user.id, form.clone()).await {
        Ok(blog) => Ok(Redirect::to(&format!("/{}/", blog.id)).into_response()),
        Err(BlogServiceError::ValidationError(msg)) => {
            let page = render_settings(&state, uri.path(), &user, &form, Some(&msg)).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn render_settings(
    state: &AppState,
    path: &str,
    user: &User,
    form: &BlogInput,
    error: Option<&str>,
) -> WebResult<Html<String>> {
    let blogs = state.blog_service.list_by_author(user.id).await?;

    let mut context = TeraContext::new();
    context.insert("blogs", &blogs);
    context.insert("form", form);
    context.insert("error", &error);
    Ok(state.render("blog_settings.html", &context, path, Some(user)))
}
