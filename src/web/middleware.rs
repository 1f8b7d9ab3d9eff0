//! Web middleware and shared state
//!
//! The session cookie is resolved once per request by `optional_auth`, which
//! stashes the authenticated user in the request extensions. Handlers that
//! require a login redirect anonymous visitors to the login page with a
//! `next` parameter pointing back.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::MediaConfig;
use crate::db::DynDatabasePool;
use crate::models::User;
use crate::services::{CommentService, PostService, UserService};
use crate::web::render::Templates;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session";

/// Session lifetime mirrored into the cookie's Max-Age
const SESSION_COOKIE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
    pub comment_service: Arc<CommentService>,
    pub templates: Templates,
    pub media: Arc<MediaConfig>,
}

/// Authenticated user extracted from the session cookie
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Infallible extractor for the request's viewer, authenticated or not.
///
/// Relies on `optional_auth` having run; without it the viewer is simply
/// anonymous.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .cloned()
                .map(|a| a.0),
        ))
    }
}

/// Read a cookie value out of the Cookie header
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?;
    let cookie_str = cookie_header.to_str().ok()?;
    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(name).and_then(|c| c.strip_prefix('=')) {
            return Some(value.to_string());
        }
    }
    None
}

/// Authentication middleware: resolves the session cookie to a user when
/// possible, without requiring one.
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = cookie_value(request.headers(), SESSION_COOKIE) {
        if let Ok(Some(user)) = state.user_service.validate_session(&token).await {
            request.extensions_mut().insert(AuthenticatedUser(user));
        }
    }
    next.run(request).await
}

/// Redirect an anonymous visitor to the login page, preserving where they
/// were headed.
pub fn login_redirect(next: &str) -> Response {
    Redirect::to(&format!("/auth/login?next={}", urlencoding::encode(next))).into_response()
}

/// Attach the session cookie to a response
pub fn set_session_cookie(response: &mut Response, token: &str) {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, SESSION_COOKIE_MAX_AGE_SECS
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}

/// Expire the session cookie
pub fn clear_session_cookie(response: &mut Response) {
    let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}
