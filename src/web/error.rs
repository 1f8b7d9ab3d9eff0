//! HTML-facing error type
//!
//! Maps the failure taxonomy onto responses: missing or invisible resources
//! render the 404 page, a failed request signature check renders the 403
//! page, anything unexpected renders the 500 page and is logged.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::services::{CommentServiceError, PostServiceError, UserServiceError};

const NOT_FOUND_PAGE: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8"><title>Page not found</title></head>
<body><main><h1>404 &mdash; Page not found</h1>
<p>The page you requested does not exist.</p>
<p><a href="/">Back to the feed</a></p></main></body></html>"#;

const CSRF_FAILURE_PAGE: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8"><title>Request rejected</title></head>
<body><main><h1>403 &mdash; Request rejected</h1>
<p>The request could not be verified. Go back, reload the form and try again.</p>
<p><a href="/">Back to the feed</a></p></main></body></html>"#;

const SERVER_ERROR_PAGE: &str = r#"<!doctype html>
<html lang="en"><head><meta charset="utf-8"><title>Server error</title></head>
<body><main><h1>500 &mdash; Server error</h1>
<p>Something went wrong on our side.</p>
<p><a href="/">Back to the feed</a></p></main></body></html>"#;

/// Error response for page handlers
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    /// The requested resource does not exist or is not visible to the
    /// requester
    #[error("Not found")]
    NotFound,

    /// The request failed the CSRF check
    #[error("Request verification failed")]
    CsrfRejected,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound => {
                (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response()
            }
            PageError::CsrfRejected => {
                (StatusCode::FORBIDDEN, Html(CSRF_FAILURE_PAGE)).into_response()
            }
            PageError::Internal(err) => {
                tracing::error!("Request failed: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_PAGE)).into_response()
            }
        }
    }
}

impl From<PostServiceError> for PageError {
    fn from(err: PostServiceError) -> Self {
        match err {
            PostServiceError::NotFound | PostServiceError::PageOutOfRange => PageError::NotFound,
            PostServiceError::InternalError(e) => PageError::Internal(e),
        }
    }
}

impl From<CommentServiceError> for PageError {
    fn from(err: CommentServiceError) -> Self {
        match err {
            CommentServiceError::NotFound | CommentServiceError::PageOutOfRange => {
                PageError::NotFound
            }
            CommentServiceError::InternalError(e) => PageError::Internal(e),
        }
    }
}

impl From<UserServiceError> for PageError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InternalError(e) => PageError::Internal(e),
            other => PageError::Internal(anyhow::Error::new(other)),
        }
    }
}
