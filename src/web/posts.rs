//! Post pages: feed, detail, category listing, and the create/edit/delete
//! forms.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::models::{CreatePostInput, ListParams, Post, UpdatePostInput, User};
use crate::services::authz::{self, Decision};
use crate::web::{
    csrf,
    error::PageError,
    middleware::{login_redirect, AppState, CurrentUser},
    render::{base_context, insert_pagination},
    uploads, PageQuery, COMMENTS_PER_PAGE, POSTS_PER_PAGE,
};

/// `GET /` - the public feed
pub async fn index(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let params = ListParams::from_page(query.page.as_deref(), POSTS_PER_PAGE);

    let feed = state.post_service.public_feed(params, Utc::now()).await?;

    let (csrf_token, fresh) = csrf::ensure(&headers);
    let mut context = base_context(viewer.as_ref());
    context.insert("posts", &feed.items);
    insert_pagination(&mut context, &feed);
    context.insert("csrf_token", &csrf_token);

    let mut response = state.templates.render("index.html", &context)?.into_response();
    if fresh {
        csrf::set_cookie(&mut response, &csrf_token);
    }
    Ok(response)
}

/// `GET /posts/{post_id}` - one post with its comment thread
pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(post_id): Path<i64>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let post = state
        .post_service
        .detail_for(viewer.as_ref(), post_id, Utc::now())
        .await?;

    let params = ListParams::from_page(query.page.as_deref(), COMMENTS_PER_PAGE);
    let comments = state.comment_service.thread(post_id, params).await?;

    let (csrf_token, fresh) = csrf::ensure(&headers);
    let mut context = base_context(viewer.as_ref());
    context.insert("post", &post);
    context.insert("comments", &comments.items);
    insert_pagination(&mut context, &comments);
    context.insert("can_comment", &viewer.is_some());
    context.insert("csrf_token", &csrf_token);

    let mut response = state.templates.render("detail.html", &context)?.into_response();
    if fresh {
        csrf::set_cookie(&mut response, &csrf_token);
    }
    Ok(response)
}

/// `GET /category/{slug}` - posts of one published category
pub async fn category(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let params = ListParams::from_page(query.page.as_deref(), POSTS_PER_PAGE);

    let (category, feed) = state
        .post_service
        .category_feed(&slug, params, Utc::now())
        .await?;

    let (csrf_token, fresh) = csrf::ensure(&headers);
    let mut context = base_context(viewer.as_ref());
    context.insert("category", &category);
    context.insert("posts", &feed.items);
    insert_pagination(&mut context, &feed);
    context.insert("csrf_token", &csrf_token);

    let mut response = state
        .templates
        .render("category.html", &context)?
        .into_response();
    if fresh {
        csrf::set_cookie(&mut response, &csrf_token);
    }
    Ok(response)
}

// ============================================================================
// Post form handling
// ============================================================================

/// Values carried by the post create/edit form
#[derive(Debug, Default)]
struct PostFormData {
    title: String,
    body: String,
    pub_date: String,
    is_published: bool,
    category_id: Option<i64>,
    location_id: Option<i64>,
    image: Option<(String, Vec<u8>)>,
    csrf_token: String,
}

impl PostFormData {
    fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            body: post.body.clone(),
            pub_date: format_pub_date(post.pub_date),
            is_published: post.is_published,
            category_id: post.category_id,
            location_id: post.location_id,
            image: None,
            csrf_token: String::new(),
        }
    }
}

/// HTML datetime-local format used by the post form
fn format_pub_date(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%dT%H:%M").to_string()
}

/// Parse the form's publication timestamp, interpreted as UTC
fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    const FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d %H:%M:%S",
    ];
    let raw = raw.trim();
    for format in FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    None
}

async fn read_post_form(mut multipart: Multipart) -> Result<PostFormData, PageError> {
    let mut data = PostFormData::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read form field: {}", e))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => data.title = read_text(field).await?,
            "body" => data.body = read_text(field).await?,
            "pub_date" => data.pub_date = read_text(field).await?,
            "is_published" => {
                let value = read_text(field).await?;
                data.is_published = matches!(value.as_str(), "on" | "true" | "1");
            }
            "category" => data.category_id = read_text(field).await?.trim().parse().ok(),
            "location" => data.location_id = read_text(field).await?.trim().parse().ok(),
            "image" => {
                let content_type = field.content_type().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to read upload: {}", e))?;
                if !bytes.is_empty() {
                    if let Some(content_type) = content_type {
                        data.image = Some((content_type, bytes.to_vec()));
                    }
                }
            }
            "csrf_token" => data.csrf_token = read_text(field).await?,
            _ => {
                // Drain unknown fields so the stream keeps moving
                let _ = field.bytes().await;
            }
        }
    }

    Ok(data)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, PageError> {
    field
        .text()
        .await
        .map_err(|e| PageError::Internal(anyhow::anyhow!("Failed to read form field: {}", e)))
}

fn validate_post_form(form: &PostFormData) -> (Option<DateTime<Utc>>, Vec<String>) {
    let mut errors = Vec::new();
    if form.title.trim().is_empty() {
        errors.push("Title is required.".to_string());
    }
    if form.body.trim().is_empty() {
        errors.push("Text is required.".to_string());
    }
    let pub_date = parse_pub_date(&form.pub_date);
    if pub_date.is_none() {
        errors.push("Enter a valid publication date and time.".to_string());
    }
    (pub_date, errors)
}

async fn render_post_form(
    state: &AppState,
    viewer: &User,
    headers: &HeaderMap,
    form: &PostFormData,
    current_image: Option<&str>,
    errors: &[String],
    action: &str,
) -> Result<Response, PageError> {
    let (categories, locations) = state.post_service.form_choices().await?;
    let (csrf_token, fresh) = csrf::ensure(headers);

    let mut context = base_context(Some(viewer));
    context.insert("action", action);
    context.insert("errors", errors);
    context.insert("categories", &categories);
    context.insert("locations", &locations);
    context.insert("form_title", &form.title);
    context.insert("form_body", &form.body);
    context.insert("form_pub_date", &form.pub_date);
    context.insert("form_is_published", &form.is_published);
    context.insert("form_category_id", &form.category_id);
    context.insert("form_location_id", &form.location_id);
    context.insert("current_image", &current_image);
    context.insert("csrf_token", &csrf_token);

    let mut response = state
        .templates
        .render("post_form.html", &context)?
        .into_response();
    if fresh {
        csrf::set_cookie(&mut response, &csrf_token);
    }
    Ok(response)
}

/// `GET /posts/create` - blank post form
pub async fn create_form(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect("/posts/create"));
    };

    let form = PostFormData {
        pub_date: format_pub_date(Utc::now()),
        is_published: true,
        ..PostFormData::default()
    };
    render_post_form(&state, &viewer, &headers, &form, None, &[], "/posts/create").await
}

/// `POST /posts/create` - create a post
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect("/posts/create"));
    };

    let form = read_post_form(multipart).await?;
    csrf::verify(&headers, &form.csrf_token)?;

    let (pub_date, mut errors) = validate_post_form(&form);

    let mut image_path = None;
    if errors.is_empty() {
        if let Some((content_type, bytes)) = &form.image {
            match uploads::save_post_image(&state.media, content_type, bytes).await {
                Ok(path) => image_path = Some(path),
                Err(uploads::UploadError::Io(e)) => return Err(PageError::Internal(e)),
                Err(e) => errors.push(e.to_string()),
            }
        }
    }

    if !errors.is_empty() {
        return render_post_form(
            &state,
            &viewer,
            &headers,
            &form,
            None,
            &errors,
            "/posts/create",
        )
        .await;
    }

    let input = CreatePostInput {
        title: form.title.trim().to_string(),
        body: form.body.clone(),
        image: image_path,
        pub_date: pub_date.unwrap_or_else(Utc::now),
        is_published: form.is_published,
        author_id: viewer.id,
        category_id: form.category_id,
        location_id: form.location_id,
    };
    state.post_service.create(&input).await?;

    Ok(Redirect::to(&format!("/profile/{}", viewer.username)).into_response())
}

/// `GET /posts/{post_id}/edit` - prefilled edit form (author only)
pub async fn edit_form(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect(&format!("/posts/{}/edit", post_id)));
    };

    let post = state.post_service.find(post_id).await?;
    if let Decision::DenyWithRedirect(target) = authz::authorize_post(&viewer, &post) {
        return Ok(Redirect::to(&target).into_response());
    }

    let form = PostFormData::from_post(&post);
    let action = format!("/posts/{}/edit", post_id);
    render_post_form(
        &state,
        &viewer,
        &headers,
        &form,
        post.image.as_deref(),
        &[],
        &action,
    )
    .await
}

/// `POST /posts/{post_id}/edit` - update a post (author only)
pub async fn edit(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect(&format!("/posts/{}/edit", post_id)));
    };

    let form = read_post_form(multipart).await?;
    csrf::verify(&headers, &form.csrf_token)?;

    let post = state.post_service.find(post_id).await?;
    if let Decision::DenyWithRedirect(target) = authz::authorize_post(&viewer, &post) {
        return Ok(Redirect::to(&target).into_response());
    }

    let (pub_date, mut errors) = validate_post_form(&form);

    let mut image_path = None;
    if errors.is_empty() {
        if let Some((content_type, bytes)) = &form.image {
            match uploads::save_post_image(&state.media, content_type, bytes).await {
                Ok(path) => image_path = Some(path),
                Err(uploads::UploadError::Io(e)) => return Err(PageError::Internal(e)),
                Err(e) => errors.push(e.to_string()),
            }
        }
    }

    if !errors.is_empty() {
        let action = format!("/posts/{}/edit", post_id);
        return render_post_form(
            &state,
            &viewer,
            &headers,
            &form,
            post.image.as_deref(),
            &errors,
            &action,
        )
        .await;
    }

    let replacing_image = image_path.is_some();
    let input = UpdatePostInput {
        title: form.title.trim().to_string(),
        body: form.body.clone(),
        image: image_path,
        pub_date: pub_date.unwrap_or_else(Utc::now),
        is_published: form.is_published,
        category_id: form.category_id,
        location_id: form.location_id,
    };
    state.post_service.update(post_id, &input).await?;

    if replacing_image {
        if let Some(old) = &post.image {
            uploads::remove_post_image(&state.media, old).await;
        }
    }

    Ok(Redirect::to(&format!("/posts/{}", post_id)).into_response())
}

/// Form body of the POST-only delete endpoints
#[derive(Debug, serde::Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub csrf_token: String,
}

/// `POST /posts/{post_id}/delete` - delete a post (author only)
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(post_id): Path<i64>,
    headers: HeaderMap,
    axum::Form(form): axum::Form<DeleteForm>,
) -> Result<Response, PageError> {
    let Some(viewer) = viewer else {
        return Ok(login_redirect(&format!("/posts/{}", post_id)));
    };

    csrf::verify(&headers, &form.csrf_token)?;

    let post = state.post_service.find(post_id).await?;
    if let Decision::DenyWithRedirect(target) = authz::authorize_post(&viewer, &post) {
        return Ok(Redirect::to(&target).into_response());
    }

    state.post_service.delete(post_id).await?;
    if let Some(image) = &post.image {
        uploads::remove_post_image(&state.media, image).await;
    }

    Ok(Redirect::to(&format!("/profile/{}", viewer.username)).into_response())
}
