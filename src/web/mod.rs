//! Web layer - server-rendered pages and routing
//!
//! Handlers resolve the target collection, let the authorship gate decide
//! whether the visibility predicate applies, and hand the result to the
//! templates. Mutations are POST-only, CSRF-checked, and redirect on
//! success; denied mutations redirect to the post's read view.

pub mod auth;
pub mod comments;
pub mod csrf;
pub mod error;
pub mod middleware;
pub mod posts;
pub mod profile;
pub mod render;
pub mod uploads;

#[cfg(test)]
mod tests;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub use error::PageError;
pub use middleware::AppState;

/// Page size of the post listings (feed, category, profile)
pub const POSTS_PER_PAGE: u32 = 10;

/// Page size of a post's comment thread
pub const COMMENTS_PER_PAGE: u32 = 10;

/// Upper bound for multipart submissions; actual image limits come from the
/// media config
const FORM_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// The `?page=` query string shared by every listing page.
///
/// Kept as a raw string so that junk values degrade to page 1 instead of a
/// rejection.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let media_root = state.media.root.clone();

    Router::new()
        .route("/", get(posts::index))
        .route("/posts/create", get(posts::create_form).post(posts::create))
        .route("/posts/{post_id}", get(posts::detail))
        .route(
            "/posts/{post_id}/edit",
            get(posts::edit_form).post(posts::edit),
        )
        .route("/posts/{post_id}/delete", post(posts::delete))
        .route("/posts/{post_id}/comment", post(comments::add))
        .route(
            "/posts/{post_id}/edit_comment/{comment_id}",
            get(comments::edit_form).post(comments::edit),
        )
        .route(
            "/posts/{post_id}/delete_comment/{comment_id}",
            post(comments::delete),
        )
        .route("/category/{slug}", get(posts::category))
        .route("/profile/edit", get(profile::edit_form).post(profile::edit))
        .route("/profile/{username}", get(profile::show))
        .route(
            "/auth/registration",
            get(auth::registration_form).post(auth::register),
        )
        .route("/auth/login", get(auth::login_form).post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .nest_service("/media", ServeDir::new(media_root))
        .layer(DefaultBodyLimit::max(FORM_BODY_LIMIT))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
