//! Account pages: registration, login, logout.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::services::{LoginInput, RegisterInput, UserServiceError};
use crate::web::{
    csrf,
    error::PageError,
    middleware::{clear_session_cookie, cookie_value, set_session_cookie, AppState, SESSION_COOKIE},
    render::base_context,
};

/// Query string of the login page
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Body of the login form
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Body of the registration form
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Body of the logout form
#[derive(Debug, Deserialize)]
pub struct LogoutForm {
    #[serde(default)]
    pub csrf_token: String,
}

/// Only site-local redirect targets are honored after login
fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") {
        next
    } else {
        "/"
    }
}

fn render_login(
    state: &AppState,
    headers: &HeaderMap,
    next: &str,
    username_value: &str,
    errors: &[String],
) -> Result<Response, PageError> {
    let (csrf_token, fresh) = csrf::ensure(headers);

    let mut context = base_context(None);
    context.insert("next", next);
    context.insert("username_value", username_value);
    context.insert("errors", errors);
    context.insert("csrf_token", &csrf_token);

    let mut response = state.templates.render("login.html", &context)?.into_response();
    if fresh {
        csrf::set_cookie(&mut response, &csrf_token);
    }
    Ok(response)
}

fn render_registration(
    state: &AppState,
    headers: &HeaderMap,
    form: &RegisterForm,
    errors: &[String],
) -> Result<Response, PageError> {
    let (csrf_token, fresh) = csrf::ensure(headers);

    let mut context = base_context(None);
    context.insert("form_username", &form.username);
    context.insert("form_email", &form.email);
    context.insert("errors", errors);
    context.insert("csrf_token", &csrf_token);

    let mut response = state
        .templates
        .render("registration.html", &context)?
        .into_response();
    if fresh {
        csrf::set_cookie(&mut response, &csrf_token);
    }
    Ok(response)
}

/// `GET /auth/login`
pub async fn login_form(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let next = query.next.as_deref().unwrap_or("/").to_string();
    render_login(&state, &headers, safe_next(&next), "", &[])
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    csrf::verify(&headers, &form.csrf_token)?;

    let input = LoginInput::new(form.username.trim(), form.password.as_str());
    match state.user_service.login(input).await {
        Ok(session) => {
            let mut response = Redirect::to(safe_next(&form.next)).into_response();
            set_session_cookie(&mut response, &session.id);
            Ok(response)
        }
        Err(UserServiceError::AuthenticationError(msg)) => render_login(
            &state,
            &headers,
            safe_next(&form.next),
            form.username.trim(),
            &[msg],
        ),
        Err(e) => Err(e.into()),
    }
}

/// `GET /auth/registration`
pub async fn registration_form(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let form = RegisterForm {
        username: String::new(),
        email: String::new(),
        password: String::new(),
        csrf_token: String::new(),
    };
    render_registration(&state, &headers, &form, &[])
}

/// `POST /auth/registration`
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<RegisterForm>,
) -> Result<Response, PageError> {
    csrf::verify(&headers, &form.csrf_token)?;

    let input = RegisterInput::new(
        form.username.trim(),
        form.email.trim(),
        form.password.as_str(),
    );
    match state.user_service.register(input).await {
        Ok(_) => Ok(Redirect::to("/auth/login").into_response()),
        Err(UserServiceError::ValidationError(msg)) | Err(UserServiceError::UserExists(msg)) => {
            render_registration(&state, &headers, &form, &[msg])
        }
        Err(e) => Err(e.into()),
    }
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LogoutForm>,
) -> Result<Response, PageError> {
    csrf::verify(&headers, &form.csrf_token)?;

    if let Some(token) = cookie_value(&headers, SESSION_COOKIE) {
        state.user_service.logout(&token).await?;
    }

    let mut response = Redirect::to("/").into_response();
    clear_session_cookie(&mut response);
    Ok(response)
}
