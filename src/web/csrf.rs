//! Cross-site request forgery protection
//!
//! Double-submit scheme: a random token lives in a cookie and is echoed back
//! in a hidden form field. Every state-changing handler compares the two;
//! a mismatch renders the 403 page.

use axum::{
    http::{header, HeaderMap, HeaderValue},
    response::Response,
};
use uuid::Uuid;

use crate::web::error::PageError;
use crate::web::middleware::cookie_value;

/// Name of the CSRF cookie
pub const CSRF_COOKIE: &str = "csrftoken";

/// Generate a fresh token
pub fn issue() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// The token currently carried by the request, if any
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, CSRF_COOKIE).filter(|t| !t.is_empty())
}

/// Token to embed in a form: the cookie's token, or a fresh one when the
/// visitor has none yet. The second element says whether the cookie must be
/// (re)set on the response.
pub fn ensure(headers: &HeaderMap) -> (String, bool) {
    match cookie_token(headers) {
        Some(token) => (token, false),
        None => (issue(), true),
    }
}

/// Verify a submitted form token against the cookie
pub fn verify(headers: &HeaderMap, submitted: &str) -> Result<(), PageError> {
    let cookie = cookie_token(headers).ok_or(PageError::CsrfRejected)?;
    if submitted.is_empty() || submitted != cookie {
        return Err(PageError::CsrfRejected);
    }
    Ok(())
}

/// Attach the CSRF cookie to a response
pub fn set_cookie(response: &mut Response, token: &str) {
    let cookie = format!("{}={}; Path=/; SameSite=Lax", CSRF_COOKIE, token);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
}
