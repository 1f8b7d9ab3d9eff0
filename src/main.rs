//! Chronica - a multi-author blog engine with scheduled publication

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chronica::{
    config::Config,
    db::{
        self,
        repositories::{
            SqlxCategoryRepository, SqlxCommentRepository, SqlxLocationRepository,
            SqlxPostRepository, SqlxSessionRepository, SqlxUserRepository,
        },
    },
    services::{CommentService, PostService, UserService},
    web::{self, render::Templates, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chronica=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Chronica blog engine...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Load templates
    let templates = Templates::load(&config.templates.dir)?;
    tracing::info!("Templates loaded from {:?}", config.templates.dir);

    // Ensure the media root exists before anything is uploaded
    tokio::fs::create_dir_all(&config.media.root).await?;

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let category_repo = SqlxCategoryRepository::boxed(pool.clone());
    let location_repo = SqlxLocationRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::new(user_repo, session_repo));
    let post_service = Arc::new(PostService::new(post_repo, category_repo, location_repo));
    let comment_service = Arc::new(CommentService::new(comment_repo));

    // Periodic session cleanup
    {
        let user_service = user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match user_service.cleanup_expired_sessions().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!("Removed {} expired session(s)", n),
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
            }
        });
    }

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        user_service,
        post_service,
        comment_service,
        templates,
        media: Arc::new(config.media.clone()),
    };

    // Build router
    let app = web::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
