//! Comment handlers: add to a post, edit and delete one's own comments.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::models::{NewComment, User};
use crate::services::authz::{self, Decision};
use crate::web::{
    csrf,
    error::PageError,
    middleware::{login_redirect, AppState, CurrentUser},
    render::base_context,
};

/// Body of the comment forms
#[derive(Debug, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Body of the comment delete form
#[derive(Debug, Deserialize)]
pub struct DeleteCommentForm {
    #[serde(default)]
    pub csrf_token: String,
}

async fn render_comment_form(
    state: &AppState,
    viewer: &User,
    headers: &HeaderMap,
    action: &str,
    post_id: i64,
    body: &str,
    errors: &[String],
) -> Result<Response, PageError> {
    let (csrf_token, fresh) = csrf::ensure(headers);

    let mut context = base_context(Some(viewer));
    context.insert("action", action);
    context.insert("post_id", &post_id);
    context.insert("form_body", body);
    context.insert("errors", errors);
    context.insert("csrf_token", &csrf_token);

    let mut response = state
        .templates
        .render("comment_form.html", &context)?
        .into_response();
    if fresh {
        csrf::set_cookie(&mut response, &csrf_token);
    }
    Ok(response)
}

/// `POST /posts/{post_id}/comment` - add a comment
pub async fn add(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
    Form(form): Form<CommentForm>,
) -> Result<Response, PageError> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect(&format!("/posts/{}", post_id)));
    };

    csrf::verify(&headers, &form.csrf_token)?;

    let post = state.post_service.find(post_id).await?;

    if form.body.trim().is_empty() {
        let action = format!("/posts/{}/comment", post_id);
        return render_comment_form(
            &state,
            &viewer,
            &headers,
            &action,
            post_id,
            &form.body,
            &["Comment text is required.".to_string()],
        )
        .await;
    }

    state
        .comment_service
        .add(NewComment {
            body: form.body.trim().to_string(),
            author_id: viewer.id,
            post_id: post.id,
        })
        .await?;

    Ok(Redirect::to(&format!("/posts/{}", post_id)).into_response())
}

/// `GET /posts/{post_id}/edit_comment/{comment_id}` - prefilled edit form
pub async fn edit_form(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect(&format!(
            "/posts/{}/edit_comment/{}",
            post_id, comment_id
        )));
    };

    let comment = state.comment_service.find(comment_id).await?;
    if comment.post_id != post_id {
        return Err(PageError::NotFound);
    }
    if let Decision::DenyWithRedirect(target) = authz::authorize_comment(&viewer, &comment) {
        return Ok(Redirect::to(&target).into_response());
    }

    let action = format!("/posts/{}/edit_comment/{}", post_id, comment_id);
    render_comment_form(&state, &viewer, &headers, &action, post_id, &comment.body, &[]).await
}

/// `POST /posts/{post_id}/edit_comment/{comment_id}` - update a comment
pub async fn edit(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    Form(form): Form<CommentForm>,
) -> Result<Response, PageError> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect(&format!(
            "/posts/{}/edit_comment/{}",
            post_id, comment_id
        )));
    };

    csrf::verify(&headers, &form.csrf_token)?;

    let comment = state.comment_service.find(comment_id).await?;
    if comment.post_id != post_id {
        return Err(PageError::NotFound);
    }
    if let Decision::DenyWithRedirect(target) = authz::authorize_comment(&viewer, &comment) {
        return Ok(Redirect::to(&target).into_response());
    }

    if form.body.trim().is_empty() {
        let action = format!("/posts/{}/edit_comment/{}", post_id, comment_id);
        return render_comment_form(
            &state,
            &viewer,
            &headers,
            &action,
            post_id,
            &form.body,
            &["Comment text is required.".to_string()],
        )
        .await;
    }

    state
        .comment_service
        .edit(comment_id, form.body.trim())
        .await?;

    Ok(Redirect::to(&format!("/posts/{}", post_id)).into_response())
}

/// `POST /posts/{post_id}/delete_comment/{comment_id}` - delete a comment
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path((post_id, comment_id)): Path<(i64, i64)>,
    headers: HeaderMap,
    Form(form): Form<DeleteCommentForm>,
) -> Result<Response, PageError> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect(&format!("/posts/{}", post_id)));
    };

    csrf::verify(&headers, &form.csrf_token)?;

    let comment = state.comment_service.find(comment_id).await?;
    if comment.post_id != post_id {
        return Err(PageError::NotFound);
    }
    if let Decision::DenyWithRedirect(target) = authz::authorize_comment(&viewer, &comment) {
        return Ok(Redirect::to(&target).into_response());
    }

    state.comment_service.remove(comment_id).await?;

    Ok(Redirect::to(&format!("/posts/{}", post_id)).into_response())
}
