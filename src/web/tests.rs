//! End-to-end tests driving the full router against an in-memory database.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use tower::ServiceExt;

use crate::config::MediaConfig;
use crate::db::repositories::{
    CategoryRepository, SqlxCategoryRepository, SqlxCommentRepository, SqlxLocationRepository,
    SqlxPostRepository, SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::{create_test_pool, migrations, DynDatabasePool};
use crate::models::{CreatePostInput, NewCategory, Post, User};
use crate::services::{CommentService, LoginInput, PostService, RegisterInput, UserService};
use crate::web::middleware::AppState;
use crate::web::render::Templates;
use crate::web::build_router;

const CSRF: &str = "test-csrf-token";

struct TestApp {
    router: Router,
    user_service: Arc<UserService>,
    post_service: Arc<PostService>,
    category_id: i64,
    _pool: DynDatabasePool,
    _media_dir: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let categories = SqlxCategoryRepository::new(pool.clone());
    let category = categories
        .create(&NewCategory::new("General", "general"))
        .await
        .expect("Failed to seed category");

    let media_dir = tempfile::tempdir().expect("Failed to create media dir");

    let user_service = Arc::new(UserService::new(
        SqlxUserRepository::boxed(pool.clone()),
        SqlxSessionRepository::boxed(pool.clone()),
    ));
    let post_service = Arc::new(PostService::new(
        SqlxPostRepository::boxed(pool.clone()),
        SqlxCategoryRepository::boxed(pool.clone()),
        SqlxLocationRepository::boxed(pool.clone()),
    ));
    let comment_service = Arc::new(CommentService::new(SqlxCommentRepository::boxed(
        pool.clone(),
    )));

    let state = AppState {
        pool: pool.clone(),
        user_service: user_service.clone(),
        post_service: post_service.clone(),
        comment_service,
        templates: Templates::load(Path::new("templates")).expect("Failed to load templates"),
        media: Arc::new(MediaConfig {
            root: media_dir.path().to_path_buf(),
            ..MediaConfig::default()
        }),
    };

    TestApp {
        router: build_router(state),
        user_service,
        post_service,
        category_id: category.id,
        _pool: pool,
        _media_dir: media_dir,
    }
}

impl TestApp {
    async fn register_and_login(&self, username: &str) -> (User, String) {
        let user = self
            .user_service
            .register(RegisterInput::new(
                username,
                format!("{}@example.com", username),
                "password123",
            ))
            .await
            .expect("Failed to register");
        let session = self
            .user_service
            .login(LoginInput::new(username, "password123"))
            .await
            .expect("Failed to login");
        let cookie = format!("session={}; csrftoken={}", session.id, CSRF);
        (user, cookie)
    }

    async fn seed_post(&self, author: &User, title: &str, is_published: bool) -> Post {
        self.seed_post_at(author, title, is_published, Utc::now()).await
    }

    async fn seed_post_at(
        &self,
        author: &User,
        title: &str,
        is_published: bool,
        pub_date: chrono::DateTime<Utc>,
    ) -> Post {
        self.post_service
            .create(&CreatePostInput {
                title: title.to_string(),
                body: format!("Body of {}", title),
                image: None,
                pub_date,
                is_published,
                author_id: author.id,
                category_id: Some(self.category_id),
                location_id: None,
            })
            .await
            .expect("Failed to seed post")
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::empty()).expect("Failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed")
    }

    async fn post_form(&self, uri: &str, cookie: Option<&str>, fields: &[(&str, &str)]) -> Response {
        let body = fields
            .iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    urlencoding::encode(k),
                    urlencoding::encode(v)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::from(body)).expect("Failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed")
    }

    async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
    ) -> Response {
        let boundary = "----chronica-test-boundary";
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            ));
        }
        body.push_str(&format!("--{}--\r\n", boundary));

        let mut builder = Request::builder().method("POST").uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(Body::from(body)).expect("Failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed")
    }
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("Failed to read body");
    String::from_utf8_lossy(&bytes).to_string()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// Feed and detail pages
// ============================================================================

#[tokio::test]
async fn test_empty_feed_renders() {
    let app = spawn_app().await;

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("No posts yet"));
}

#[tokio::test]
async fn test_feed_lists_visible_posts_newest_first() {
    let app = spawn_app().await;
    let (author, _) = app.register_and_login("writer").await;

    app.seed_post_at(&author, "Older", true, Utc::now() - Duration::days(1))
        .await;
    app.seed_post(&author, "Newer", true).await;
    app.seed_post(&author, "Draft", false).await;

    let body = body_text(app.get("/", None).await).await;
    assert!(body.contains("Newer"));
    assert!(body.contains("Older"));
    assert!(!body.contains("Draft"));
    let newer_at = body.find("Newer").unwrap();
    let older_at = body.find("Older").unwrap();
    assert!(newer_at < older_at, "newest post should render first");
}

#[tokio::test]
async fn test_future_post_hidden_except_for_author() {
    let app = spawn_app().await;
    let (author, author_cookie) = app.register_and_login("scheduler").await;
    let (_, other_cookie) = app.register_and_login("reader").await;

    let post = app
        .seed_post_at(&author, "Tomorrow", true, Utc::now() + Duration::days(1))
        .await;

    // Not in the public feed
    let body = body_text(app.get("/", None).await).await;
    assert!(!body.contains("Tomorrow"));

    // Detail page is a 404 for everyone but the author
    let response = app.get(&format!("/posts/{}", post.id), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app
        .get(&format!("/posts/{}", post.id), Some(&other_cookie))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .get(&format!("/posts/{}", post.id), Some(&author_cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Tomorrow"));
}

#[tokio::test]
async fn test_detail_unknown_post_is_404() {
    let app = spawn_app().await;
    let response = app.get("/posts/9999", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_page_out_of_range_is_404_and_junk_page_is_page_one() {
    let app = spawn_app().await;
    let (author, _) = app.register_and_login("pager").await;
    app.seed_post(&author, "Single", true).await;

    let response = app.get("/?page=99", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/?page=abc", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Single"));
}

#[tokio::test]
async fn test_category_page_and_unknown_category() {
    let app = spawn_app().await;
    let (author, _) = app.register_and_login("catwriter").await;
    app.seed_post(&author, "Categorized", true).await;

    let response = app.get("/category/general", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Categorized"));
    assert!(body.contains("General"));

    let response = app.get("/category/missing", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Registration / login / logout
// ============================================================================

#[tokio::test]
async fn test_registration_and_login_flow() {
    let app = spawn_app().await;
    let csrf_cookie = format!("csrftoken={}", CSRF);

    let response = app
        .post_form(
            "/auth/registration",
            Some(&csrf_cookie),
            &[
                ("username", "newcomer"),
                ("email", "newcomer@example.com"),
                ("password", "password123"),
                ("csrf_token", CSRF),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    let response = app
        .post_form(
            "/auth/login",
            Some(&csrf_cookie),
            &[
                ("username", "newcomer"),
                ("password", "password123"),
                ("next", "/posts/create"),
                ("csrf_token", CSRF),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/posts/create");
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("session="));
}

#[tokio::test]
async fn test_login_bad_credentials_rerenders_form() {
    let app = spawn_app().await;
    app.register_and_login("existing").await;
    let csrf_cookie = format!("csrftoken={}", CSRF);

    let response = app
        .post_form(
            "/auth/login",
            Some(&csrf_cookie),
            &[
                ("username", "existing"),
                ("password", "wrong"),
                ("csrf_token", CSRF),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Invalid username or password"));
}

#[tokio::test]
async fn test_duplicate_registration_rerenders_with_message() {
    let app = spawn_app().await;
    app.register_and_login("taken").await;
    let csrf_cookie = format!("csrftoken={}", CSRF);

    let response = app
        .post_form(
            "/auth/registration",
            Some(&csrf_cookie),
            &[
                ("username", "taken"),
                ("email", "fresh@example.com"),
                ("password", "password123"),
                ("csrf_token", CSRF),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("already taken"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = spawn_app().await;
    let (_, cookie) = app.register_and_login("leaver").await;

    let response = app
        .post_form("/auth/logout", Some(&cookie), &[("csrf_token", CSRF)])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.contains("Max-Age=0"));

    // The old session no longer authenticates
    let response = app.get("/posts/create", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login"));
}

// ============================================================================
// Post creation and mutation
// ============================================================================

#[tokio::test]
async fn test_unauthenticated_create_redirects_to_login() {
    let app = spawn_app().await;

    let response = app.get("/posts/create", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login?next=%2Fposts%2Fcreate");
}

#[tokio::test]
async fn test_create_post_via_form() {
    let app = spawn_app().await;
    let (_, cookie) = app.register_and_login("poster").await;

    let response = app
        .post_multipart(
            "/posts/create",
            Some(&cookie),
            &[
                ("title", "Fresh off the form"),
                ("body", "Some text"),
                ("pub_date", "2020-01-01T10:00"),
                ("is_published", "on"),
                ("category", ""),
                ("location", ""),
                ("csrf_token", CSRF),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/poster");

    // Without a category the post is only on the author's own profile
    let body = body_text(app.get("/profile/poster", Some(&cookie)).await).await;
    assert!(body.contains("Fresh off the form"));
    let body = body_text(app.get("/", None).await).await;
    assert!(!body.contains("Fresh off the form"));
}

#[tokio::test]
async fn test_create_post_validation_rerenders_form() {
    let app = spawn_app().await;
    let (_, cookie) = app.register_and_login("sloppy").await;

    let response = app
        .post_multipart(
            "/posts/create",
            Some(&cookie),
            &[
                ("title", ""),
                ("body", "text"),
                ("pub_date", "not-a-date"),
                ("csrf_token", CSRF),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Title is required."));
    assert!(body.contains("Enter a valid publication date and time."));
}

#[tokio::test]
async fn test_foreign_edit_soft_denied() {
    let app = spawn_app().await;
    let (author, _) = app.register_and_login("owner").await;
    let (_, intruder_cookie) = app.register_and_login("intruder").await;

    let post = app.seed_post(&author, "Untouchable", true).await;

    // GET of the edit form redirects to the detail page
    let response = app
        .get(&format!("/posts/{}/edit", post.id), Some(&intruder_cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", post.id));

    // POSTing an edit is denied the same way and changes nothing
    let response = app
        .post_multipart(
            &format!("/posts/{}/edit", post.id),
            Some(&intruder_cookie),
            &[
                ("title", "Hijacked"),
                ("body", "gotcha"),
                ("pub_date", "2020-01-01T10:00"),
                ("csrf_token", CSRF),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", post.id));

    let unchanged = app.post_service.find(post.id).await.unwrap();
    assert_eq!(unchanged.title, "Untouchable");
}

#[tokio::test]
async fn test_foreign_delete_soft_denied_author_delete_works() {
    let app = spawn_app().await;
    let (author, author_cookie) = app.register_and_login("keeper").await;
    let (_, intruder_cookie) = app.register_and_login("grimreaper").await;

    let post = app.seed_post(&author, "Contested", true).await;

    let response = app
        .post_form(
            &format!("/posts/{}/delete", post.id),
            Some(&intruder_cookie),
            &[("csrf_token", CSRF)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", post.id));
    assert!(app.post_service.find(post.id).await.is_ok());

    let response = app
        .post_form(
            &format!("/posts/{}/delete", post.id),
            Some(&author_cookie),
            &[("csrf_token", CSRF)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/keeper");
    assert!(app.post_service.find(post.id).await.is_err());
}

#[tokio::test]
async fn test_author_edits_own_post() {
    let app = spawn_app().await;
    let (author, cookie) = app.register_and_login("editor").await;
    let post = app.seed_post(&author, "Before", true).await;

    let response = app
        .post_multipart(
            &format!("/posts/{}/edit", post.id),
            Some(&cookie),
            &[
                ("title", "After"),
                ("body", "New body"),
                ("pub_date", "2020-01-01T10:00"),
                ("is_published", "on"),
                ("category", ""),
                ("location", ""),
                ("csrf_token", CSRF),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", post.id));

    let updated = app.post_service.find(post.id).await.unwrap();
    assert_eq!(updated.title, "After");
}

// ============================================================================
// CSRF
// ============================================================================

#[tokio::test]
async fn test_mismatched_csrf_token_is_403() {
    let app = spawn_app().await;
    let (author, cookie) = app.register_and_login("csrfy").await;
    let post = app.seed_post(&author, "Guarded", true).await;

    let response = app
        .post_form(
            &format!("/posts/{}/comment", post.id),
            Some(&cookie),
            &[("body", "sneaky"), ("csrf_token", "wrong-token")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_missing_csrf_cookie_is_403() {
    let app = spawn_app().await;
    let (author, cookie) = app.register_and_login("csrfless").await;
    let post = app.seed_post(&author, "Guarded", true).await;

    // Session cookie without a csrf cookie
    let session_only = cookie.split(';').next().unwrap().to_string();
    let response = app
        .post_form(
            &format!("/posts/{}/comment", post.id),
            Some(&session_only),
            &[("body", "sneaky"), ("csrf_token", CSRF)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Comments
// ============================================================================

#[tokio::test]
async fn test_comment_flow() {
    let app = spawn_app().await;
    let (author, author_cookie) = app.register_and_login("blogger").await;
    let (_, commenter_cookie) = app.register_and_login("visitor").await;
    let post = app.seed_post(&author, "Discussable", true).await;

    // Anonymous commenting bounces to login
    let response = app
        .post_form(
            &format!("/posts/{}/comment", post.id),
            None,
            &[("body", "anon"), ("csrf_token", CSRF)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/auth/login"));

    // First comment, then a reply from the author
    let response = app
        .post_form(
            &format!("/posts/{}/comment", post.id),
            Some(&commenter_cookie),
            &[("body", "first comment"), ("csrf_token", CSRF)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", post.id));

    let response = app
        .post_form(
            &format!("/posts/{}/comment", post.id),
            Some(&author_cookie),
            &[("body", "authors reply"), ("csrf_token", CSRF)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = body_text(app.get(&format!("/posts/{}", post.id), None).await).await;
    assert!(body.contains("first comment"));
    assert!(body.contains("authors reply"));
    // Chronological thread: the earlier comment renders first
    assert!(body.find("first comment").unwrap() < body.find("authors reply").unwrap());
    assert!(body.contains("2 comment(s)"));
}

#[tokio::test]
async fn test_foreign_comment_edit_and_delete_soft_denied() {
    let app = spawn_app().await;
    let (author, author_cookie) = app.register_and_login("talker").await;
    let (_, intruder_cookie) = app.register_and_login("meddler").await;
    let post = app.seed_post(&author, "Thread", true).await;

    app.post_form(
        &format!("/posts/{}/comment", post.id),
        Some(&author_cookie),
        &[("body", "my words"), ("csrf_token", CSRF)],
    )
    .await;

    // Find the comment id from the edit link on the detail page
    let body = body_text(app.get(&format!("/posts/{}", post.id), Some(&author_cookie)).await).await;
    let marker = format!("/posts/{}/edit_comment/", post.id);
    let idx = body.find(&marker).expect("edit link should render") + marker.len();
    let comment_id: i64 = body[idx..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap();

    let response = app
        .post_form(
            &format!("/posts/{}/edit_comment/{}", post.id, comment_id),
            Some(&intruder_cookie),
            &[("body", "overwritten"), ("csrf_token", CSRF)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/posts/{}", post.id));

    let response = app
        .post_form(
            &format!("/posts/{}/delete_comment/{}", post.id, comment_id),
            Some(&intruder_cookie),
            &[("csrf_token", CSRF)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let body = body_text(app.get(&format!("/posts/{}", post.id), None).await).await;
    assert!(body.contains("my words"));

    // The author can edit their comment
    let response = app
        .post_form(
            &format!("/posts/{}/edit_comment/{}", post.id, comment_id),
            Some(&author_cookie),
            &[("body", "edited words"), ("csrf_token", CSRF)],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let body = body_text(app.get(&format!("/posts/{}", post.id), None).await).await;
    assert!(body.contains("edited words"));
    assert!(!body.contains("my words"));
}

#[tokio::test]
async fn test_comment_id_must_belong_to_post_in_path() {
    let app = spawn_app().await;
    let (author, cookie) = app.register_and_login("crossed").await;
    let post_a = app.seed_post(&author, "A", true).await;
    let post_b = app.seed_post(&author, "B", true).await;

    app.post_form(
        &format!("/posts/{}/comment", post_a.id),
        Some(&cookie),
        &[("body", "on A"), ("csrf_token", CSRF)],
    )
    .await;

    let body = body_text(app.get(&format!("/posts/{}", post_a.id), Some(&cookie)).await).await;
    let marker = format!("/posts/{}/edit_comment/", post_a.id);
    let idx = body.find(&marker).unwrap() + marker.len();
    let comment_id: i64 = body[idx..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .parse()
        .unwrap();

    let response = app
        .get(
            &format!("/posts/{}/edit_comment/{}", post_b.id, comment_id),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Profiles
// ============================================================================

#[tokio::test]
async fn test_profile_shows_drafts_only_to_owner() {
    let app = spawn_app().await;
    let (author, author_cookie) = app.register_and_login("profiled").await;
    let (_, other_cookie) = app.register_and_login("window_shopper").await;

    app.seed_post(&author, "Public piece", true).await;
    app.seed_post(&author, "Secret draft", false).await;

    let body = body_text(app.get("/profile/profiled", Some(&other_cookie)).await).await;
    assert!(body.contains("Public piece"));
    assert!(!body.contains("Secret draft"));

    let body = body_text(app.get("/profile/profiled", None).await).await;
    assert!(!body.contains("Secret draft"));

    let body = body_text(app.get("/profile/profiled", Some(&author_cookie)).await).await;
    assert!(body.contains("Public piece"));
    assert!(body.contains("Secret draft"));
}

#[tokio::test]
async fn test_profile_unknown_user_is_404() {
    let app = spawn_app().await;
    let response = app.get("/profile/nobody", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_edit_roundtrip() {
    let app = spawn_app().await;
    let (user, cookie) = app.register_and_login("renamed").await;

    let response = app
        .post_form(
            "/profile/edit",
            Some(&cookie),
            &[
                ("first_name", "Grace"),
                ("last_name", "Hopper"),
                ("email", "grace@example.com"),
                ("csrf_token", CSRF),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/profile/renamed");

    let reloaded = app
        .user_service
        .get_by_id(user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.first_name, "Grace");
    assert_eq!(reloaded.email, "grace@example.com");

    let body = body_text(app.get("/profile/renamed", None).await).await;
    assert!(body.contains("Grace Hopper"));
}
