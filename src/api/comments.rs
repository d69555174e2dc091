//! Comment submission

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::{Deserialize, Serialize};

use crate::api::error::WebResult;
use crate::api::middleware::{AppState, MaybeUser};
use crate::api::posts::render_detail;
use crate::models::CommentInput;
use crate::services::CommentServiceError;

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub text: String,
}

/// Comment form values echoed back on the article page
#[derive(Debug, Default, Serialize)]
pub struct CommentFormView {
    pub author_name: String,
    pub text: String,
}

/// `POST /article/{post_id}/comment/`
pub async fn create_comment(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(post_id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> WebResult<Response> {
    let input = CommentInput {
        author_name: form.author_name.clone(),
        text: form.text.clone(),
    };

    match state.comment_service.create(post_id, input).await {
        Ok(_) => Ok(Redirect::to(&format!("/article/{}/", post_id)).into_response()),
        Err(CommentServiceError::ValidationError(msg)) => {
            let view = CommentFormView {
                author_name: form.author_name,
                text: form.text,
            };
            let article_path = format!("/article/{}/", post_id);
            let page =
                render_detail(&state, &article_path, user.user(), post_id, &view, Some(&msg))
                    .await?;
            tracing::debug!(post_id, "Comment rejected: {}", msg);
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
