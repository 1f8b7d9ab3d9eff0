//! Post repository
//!
//! Database operations for posts, including the feed query that powers every
//! listing page: posts joined with author, category and location, annotated
//! with their comment count, filtered by the visibility predicate and
//! ordered by publication date descending.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreatePostInput, FeedScope, Post, PostDetail, UpdatePostInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Create a new post
    async fn create(&self, input: &CreatePostInput) -> Result<Post>;

    /// Get post by ID (bare row, no joins)
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// Get post by ID with joined display data and comment count
    async fn get_detail(&self, id: i64) -> Result<Option<PostDetail>>;

    /// Update a post
    async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Post>;

    /// Delete a post (cascades to its comments)
    async fn delete(&self, id: i64) -> Result<()>;

    /// List a page of the feed.
    ///
    /// When `published_only` is set, only posts satisfying the visibility
    /// predicate at `now` are returned; otherwise every post in scope is
    /// (used for an author browsing their own profile).
    async fn list_feed(
        &self,
        scope: FeedScope,
        published_only: bool,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostDetail>>;

    /// Count the posts a feed query would return across all pages
    async fn count_feed(
        &self,
        scope: FeedScope,
        published_only: bool,
        now: DateTime<Utc>,
    ) -> Result<i64>;
}

/// SQLx-based post repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, input: &CreatePostInput) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_post_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => create_post_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_post_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_post_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_detail(&self, id: i64) -> Result<Option<PostDetail>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_detail_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_detail_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdatePostInput) -> Result<Post> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_post_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_post_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_post_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_post_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_feed(
        &self,
        scope: FeedScope,
        published_only: bool,
        now: DateTime<Utc>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<PostDetail>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_feed_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    scope,
                    published_only,
                    now,
                    offset,
                    limit,
                )
                .await
            }
            DatabaseDriver::Mysql => {
                list_feed_mysql(
                    self.pool.as_mysql().unwrap(),
                    scope,
                    published_only,
                    now,
                    offset,
                    limit,
                )
                .await
            }
        }
    }

    async fn count_feed(
        &self,
        scope: FeedScope,
        published_only: bool,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_feed_sqlite(self.pool.as_sqlite().unwrap(), scope, published_only, now).await
            }
            DatabaseDriver::Mysql => {
                count_feed_mysql(self.pool.as_mysql().unwrap(), scope, published_only, now).await
            }
        }
    }
}

// ============================================================================
// Shared SQL
// ============================================================================

/// The eager feed projection: author, category and location resolved in the
/// same round trip, with the comment count aggregated per post.
const DETAIL_SELECT: &str = r#"
SELECT p.id, p.title, p.body, p.image, p.pub_date, p.is_published, p.created_at,
       p.author_id, p.category_id, p.location_id,
       u.username AS author_username,
       c.title AS category_title, c.slug AS category_slug, c.is_published AS category_is_published,
       l.name AS location_name,
       (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
FROM posts p
JOIN users u ON u.id = p.author_id
LEFT JOIN categories c ON c.id = p.category_id
LEFT JOIN locations l ON l.id = p.location_id
"#;

const COUNT_SELECT: &str = r#"
SELECT COUNT(*) AS count
FROM posts p
LEFT JOIN categories c ON c.id = p.category_id
"#;

/// The visibility predicate as SQL. On the LEFT JOIN a missing category
/// leaves `c.is_published` NULL, which is not TRUE, so posts without a
/// category never match. Matches `PostDetail::is_visible_at`.
const VISIBLE_WHERE: &str = "p.is_published = TRUE AND c.is_published = TRUE AND p.pub_date <= ?";

fn feed_where(scope: FeedScope, published_only: bool) -> String {
    let mut clauses: Vec<&str> = Vec::new();
    if published_only {
        clauses.push(VISIBLE_WHERE);
    }
    match scope {
        FeedScope::All => {}
        FeedScope::Category(_) => clauses.push("p.category_id = ?"),
        FeedScope::Author(_) => clauses.push("p.author_id = ?"),
    }
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

fn feed_sql(scope: FeedScope, published_only: bool) -> String {
    format!(
        "{}{} ORDER BY p.pub_date DESC, p.id DESC LIMIT ? OFFSET ?",
        DETAIL_SELECT,
        feed_where(scope, published_only)
    )
}

fn count_sql(scope: FeedScope, published_only: bool) -> String {
    format!("{}{}", COUNT_SELECT, feed_where(scope, published_only))
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(pool: &SqlitePool, input: &CreatePostInput) -> Result<Post> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (title, body, image, pub_date, is_published, created_at, author_id, category_id, location_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.body)
    .bind(&input.image)
    .bind(input.pub_date)
    .bind(input.is_published)
    .bind(now)
    .bind(input.author_id)
    .bind(input.category_id)
    .bind(input.location_id)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_rowid(),
        title: input.title.clone(),
        body: input.body.clone(),
        image: input.image.clone(),
        pub_date: input.pub_date,
        is_published: input.is_published,
        created_at: now,
        author_id: input.author_id,
        category_id: input.category_id,
        location_id: input.location_id,
    })
}

async fn get_post_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, body, image, pub_date, is_published, created_at, author_id, category_id, location_id
        FROM posts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get post by ID")?;

    Ok(row.map(|row| row_to_post_sqlite(&row)))
}

async fn get_detail_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<PostDetail>> {
    let sql = format!("{} WHERE p.id = ?", DETAIL_SELECT);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post detail")?;

    Ok(row.map(|row| row_to_detail_sqlite(&row)))
}

async fn update_post_sqlite(pool: &SqlitePool, id: i64, input: &UpdatePostInput) -> Result<Post> {
    let existing = get_post_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found"))?;

    // A missing image in the input keeps the stored file
    let new_image = input.image.clone().or(existing.image);

    sqlx::query(
        r#"
        UPDATE posts
        SET title = ?, body = ?, image = ?, pub_date = ?, is_published = ?, category_id = ?, location_id = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.title)
    .bind(&input.body)
    .bind(&new_image)
    .bind(input.pub_date)
    .bind(input.is_published)
    .bind(input.category_id)
    .bind(input.location_id)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_post_by_id_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn delete_post_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;
    Ok(())
}

async fn list_feed_sqlite(
    pool: &SqlitePool,
    scope: FeedScope,
    published_only: bool,
    now: DateTime<Utc>,
    offset: i64,
    limit: i64,
) -> Result<Vec<PostDetail>> {
    let sql = feed_sql(scope, published_only);
    let mut query = sqlx::query(&sql);
    if published_only {
        query = query.bind(now);
    }
    match scope {
        FeedScope::All => {}
        FeedScope::Category(id) | FeedScope::Author(id) => query = query.bind(id),
    }
    let rows = query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list feed")?;

    Ok(rows.iter().map(row_to_detail_sqlite).collect())
}

async fn count_feed_sqlite(
    pool: &SqlitePool,
    scope: FeedScope,
    published_only: bool,
    now: DateTime<Utc>,
) -> Result<i64> {
    let sql = count_sql(scope, published_only);
    let mut query = sqlx::query(&sql);
    if published_only {
        query = query.bind(now);
    }
    match scope {
        FeedScope::All => {}
        FeedScope::Category(id) | FeedScope::Author(id) => query = query.bind(id),
    }
    let row = query
        .fetch_one(pool)
        .await
        .context("Failed to count feed")?;

    Ok(row.get("count"))
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        image: row.get("image"),
        pub_date: row.get("pub_date"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
        author_id: row.get("author_id"),
        category_id: row.get("category_id"),
        location_id: row.get("location_id"),
    }
}

fn row_to_detail_sqlite(row: &sqlx::sqlite::SqliteRow) -> PostDetail {
    PostDetail {
        post: row_to_post_sqlite(row),
        author_username: row.get("author_username"),
        category_title: row.get("category_title"),
        category_slug: row.get("category_slug"),
        category_is_published: row.get("category_is_published"),
        location_name: row.get("location_name"),
        comment_count: row.get("comment_count"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(pool: &MySqlPool, input: &CreatePostInput) -> Result<Post> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO posts (title, body, image, pub_date, is_published, created_at, author_id, category_id, location_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.body)
    .bind(&input.image)
    .bind(input.pub_date)
    .bind(input.is_published)
    .bind(now)
    .bind(input.author_id)
    .bind(input.category_id)
    .bind(input.location_id)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_id() as i64,
        title: input.title.clone(),
        body: input.body.clone(),
        image: input.image.clone(),
        pub_date: input.pub_date,
        is_published: input.is_published,
        created_at: now,
        author_id: input.author_id,
        category_id: input.category_id,
        location_id: input.location_id,
    })
}

async fn get_post_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Post>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, body, image, pub_date, is_published, created_at, author_id, category_id, location_id
        FROM posts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get post by ID")?;

    Ok(row.map(|row| row_to_post_mysql(&row)))
}

async fn get_detail_mysql(pool: &MySqlPool, id: i64) -> Result<Option<PostDetail>> {
    let sql = format!("{} WHERE p.id = ?", DETAIL_SELECT);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post detail")?;

    Ok(row.map(|row| row_to_detail_mysql(&row)))
}

async fn update_post_mysql(pool: &MySqlPool, id: i64, input: &UpdatePostInput) -> Result<Post> {
    let existing = get_post_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found"))?;

    // A missing image in the input keeps the stored file
    let new_image = input.image.clone().or(existing.image);

    sqlx::query(
        r#"
        UPDATE posts
        SET title = ?, body = ?, image = ?, pub_date = ?, is_published = ?, category_id = ?, location_id = ?
        WHERE id = ?
        "#,
    )
    .bind(&input.title)
    .bind(&input.body)
    .bind(&new_image)
    .bind(input.pub_date)
    .bind(input.is_published)
    .bind(input.category_id)
    .bind(input.location_id)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update post")?;

    get_post_by_id_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
}

async fn delete_post_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;
    Ok(())
}

async fn list_feed_mysql(
    pool: &MySqlPool,
    scope: FeedScope,
    published_only: bool,
    now: DateTime<Utc>,
    offset: i64,
    limit: i64,
) -> Result<Vec<PostDetail>> {
    let sql = feed_sql(scope, published_only);
    let mut query = sqlx::query(&sql);
    if published_only {
        query = query.bind(now);
    }
    match scope {
        FeedScope::All => {}
        FeedScope::Category(id) | FeedScope::Author(id) => query = query.bind(id),
    }
    let rows = query
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list feed")?;

    Ok(rows.iter().map(row_to_detail_mysql).collect())
}

async fn count_feed_mysql(
    pool: &MySqlPool,
    scope: FeedScope,
    published_only: bool,
    now: DateTime<Utc>,
) -> Result<i64> {
    let sql = count_sql(scope, published_only);
    let mut query = sqlx::query(&sql);
    if published_only {
        query = query.bind(now);
    }
    match scope {
        FeedScope::All => {}
        FeedScope::Category(id) | FeedScope::Author(id) => query = query.bind(id),
    }
    let row = query
        .fetch_one(pool)
        .await
        .context("Failed to count feed")?;

    Ok(row.get("count"))
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        body: row.get("body"),
        image: row.get("image"),
        pub_date: row.get("pub_date"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
        author_id: row.get("author_id"),
        category_id: row.get("category_id"),
        location_id: row.get("location_id"),
    }
}

fn row_to_detail_mysql(row: &sqlx::mysql::MySqlRow) -> PostDetail {
    PostDetail {
        post: row_to_post_mysql(row),
        author_username: row.get("author_username"),
        category_title: row.get("category_title"),
        category_slug: row.get("category_slug"),
        category_is_published: row.get("category_is_published"),
        location_name: row.get("location_name"),
        comment_count: row.get("comment_count"),
    }
}
