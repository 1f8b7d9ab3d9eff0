//! Profile pages: a user's authored posts, and editing one's own profile.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::Utc;
use serde::Deserialize;

use crate::models::{ListParams, ProfileUpdate, User};
use crate::services::UserServiceError;
use crate::web::{
    csrf,
    error::PageError,
    middleware::{login_redirect, AppState, CurrentUser},
    render::{base_context, insert_pagination},
    PageQuery, POSTS_PER_PAGE,
};

/// `GET /profile/{username}` - a user's page with their posts.
///
/// The owner sees every post they authored; everyone else sees only the
/// publicly visible ones.
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let profile = state
        .user_service
        .get_by_username(&username)
        .await?
        .ok_or(PageError::NotFound)?;

    let is_self = viewer.as_ref().map(|v| v.id == profile.id).unwrap_or(false);
    let params = ListParams::from_page(query.page.as_deref(), POSTS_PER_PAGE);
    let posts = state
        .post_service
        .profile_feed(&profile, is_self, params, Utc::now())
        .await?;

    let (csrf_token, fresh) = csrf::ensure(&headers);
    let mut context = base_context(viewer.as_ref());
    context.insert("profile", &profile);
    context.insert("profile_display_name", &profile.display_name());
    context.insert("is_self", &is_self);
    context.insert("posts", &posts.items);
    insert_pagination(&mut context, &posts);
    context.insert("csrf_token", &csrf_token);

    let mut response = state
        .templates
        .render("profile.html", &context)?
        .into_response();
    if fresh {
        csrf::set_cookie(&mut response, &csrf_token);
    }
    Ok(response)
}

/// Body of the profile edit form
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub csrf_token: String,
}

async fn render_profile_form(
    state: &AppState,
    viewer: &User,
    headers: &HeaderMap,
    values: &ProfileForm,
    errors: &[String],
) -> Result<Response, PageError> {
    let (csrf_token, fresh) = csrf::ensure(headers);

    let mut context = base_context(Some(viewer));
    context.insert("form_first_name", &values.first_name);
    context.insert("form_last_name", &values.last_name);
    context.insert("form_email", &values.email);
    context.insert("errors", errors);
    context.insert("csrf_token", &csrf_token);

    let mut response = state
        .templates
        .render("profile_form.html", &context)?
        .into_response();
    if fresh {
        csrf::set_cookie(&mut response, &csrf_token);
    }
    Ok(response)
}

/// `GET /profile/edit` - edit one's own profile
pub async fn edit_form(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect("/profile/edit"));
    };

    let values = ProfileForm {
        first_name: viewer.first_name.clone(),
        last_name: viewer.last_name.clone(),
        email: viewer.email.clone(),
        csrf_token: String::new(),
    };
    render_profile_form(&state, &viewer, &headers, &values, &[]).await
}

/// `POST /profile/edit` - save one's own profile
pub async fn edit(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    headers: HeaderMap,
    Form(form): Form<ProfileForm>,
) -> Result<Response, PageError> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect("/profile/edit"));
    };

    csrf::verify(&headers, &form.csrf_token)?;

    let update = ProfileUpdate {
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        email: form.email.clone(),
    };

    match state.user_service.update_profile(&viewer, update).await {
        Ok(updated) => {
            Ok(Redirect::to(&format!("/profile/{}", updated.username)).into_response())
        }
        Err(UserServiceError::ValidationError(msg)) | Err(UserServiceError::UserExists(msg)) => {
            render_profile_form(&state, &viewer, &headers, &form, &[msg]).await
        }
        Err(e) => Err(e.into()),
    }
}
