//! Comment repository
//!
//! Database operations for comments. Threads read oldest-first.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentDetail, NewComment};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment
    async fn create(&self, input: &NewComment) -> Result<Comment>;

    /// Get comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Replace the body of a comment
    async fn update_body(&self, id: i64, body: &str) -> Result<Comment>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<()>;

    /// List a page of a post's thread, oldest first
    async fn list_by_post(&self, post_id: i64, offset: i64, limit: i64)
        -> Result<Vec<CommentDetail>>;

    /// Count comments on a post
    async fn count_by_post(&self, post_id: i64) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, input: &NewComment) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_comment_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_comment_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_comment_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_comment_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn update_body(&self, id: i64, body: &str) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_comment_sqlite(self.pool.as_sqlite().unwrap(), id, body).await
            }
            DatabaseDriver::Mysql => {
                update_comment_mysql(self.pool.as_mysql().unwrap(), id, body).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_comment_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_comment_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_by_post(
        &self,
        post_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<CommentDetail>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_by_post_sqlite(self.pool.as_sqlite().unwrap(), post_id, offset, limit).await
            }
            DatabaseDriver::Mysql => {
                list_by_post_mysql(self.pool.as_mysql().unwrap(), post_id, offset, limit).await
            }
        }
    }

    async fn count_by_post(&self, post_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_by_post_sqlite(self.pool.as_sqlite().unwrap(), post_id).await
            }
            DatabaseDriver::Mysql => {
                count_by_post_mysql(self.pool.as_mysql().unwrap(), post_id).await
            }
        }
    }
}

/// Chronological thread order; ties broken by id so pagination is stable
const THREAD_SELECT: &str = r#"
SELECT cm.id, cm.body, cm.created_at, cm.author_id, cm.post_id,
       u.username AS author_username
FROM comments cm
JOIN users u ON u.id = cm.author_id
WHERE cm.post_id = ?
ORDER BY cm.created_at ASC, cm.id ASC
LIMIT ? OFFSET ?
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(pool: &SqlitePool, input: &NewComment) -> Result<Comment> {
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO comments (body, created_at, author_id, post_id) VALUES (?, ?, ?, ?)",
    )
    .bind(&input.body)
    .bind(now)
    .bind(input.author_id)
    .bind(input.post_id)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        body: input.body.clone(),
        created_at: now,
        author_id: input.author_id,
        post_id: input.post_id,
    })
}

async fn get_comment_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        "SELECT id, body, created_at, author_id, post_id FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment by ID")?;

    Ok(row.map(|row| row_to_comment_sqlite(&row)))
}

async fn update_comment_sqlite(pool: &SqlitePool, id: i64, body: &str) -> Result<Comment> {
    sqlx::query("UPDATE comments SET body = ? WHERE id = ?")
        .bind(body)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    get_comment_sqlite(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Comment not found after update"))
}

async fn delete_comment_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;
    Ok(())
}

async fn list_by_post_sqlite(
    pool: &SqlitePool,
    post_id: i64,
    offset: i64,
    limit: i64,
) -> Result<Vec<CommentDetail>> {
    let rows = sqlx::query(THREAD_SELECT)
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentDetail {
            comment: row_to_comment_sqlite(row),
            author_username: row.get("author_username"),
        })
        .collect())
}

async fn count_by_post_sqlite(pool: &SqlitePool, post_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM comments WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;
    Ok(row.get("count"))
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        body: row.get("body"),
        created_at: row.get("created_at"),
        author_id: row.get("author_id"),
        post_id: row.get("post_id"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(pool: &MySqlPool, input: &NewComment) -> Result<Comment> {
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO comments (body, created_at, author_id, post_id) VALUES (?, ?, ?, ?)",
    )
    .bind(&input.body)
    .bind(now)
    .bind(input.author_id)
    .bind(input.post_id)
    .execute(pool)
    .await
    .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        body: input.body.clone(),
        created_at: now,
        author_id: input.author_id,
        post_id: input.post_id,
    })
}

async fn get_comment_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        "SELECT id, body, created_at, author_id, post_id FROM comments WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment by ID")?;

    Ok(row.map(|row| row_to_comment_mysql(&row)))
}

async fn update_comment_mysql(pool: &MySqlPool, id: i64, body: &str) -> Result<Comment> {
    sqlx::query("UPDATE comments SET body = ? WHERE id = ?")
        .bind(body)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    get_comment_mysql(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Comment not found after update"))
}

async fn delete_comment_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete comment")?;
    Ok(())
}

async fn list_by_post_mysql(
    pool: &MySqlPool,
    post_id: i64,
    offset: i64,
    limit: i64,
) -> Result<Vec<CommentDetail>> {
    let rows = sqlx::query(THREAD_SELECT)
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentDetail {
            comment: row_to_comment_mysql(row),
            author_username: row.get("author_username"),
        })
        .collect())
}

async fn count_by_post_mysql(pool: &MySqlPool, post_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM comments WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(pool)
        .await
        .context("Failed to count comments")?;
    Ok(row.get("count"))
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Comment {
    Comment {
        id: row.get("id"),
        body: row.get("body"),
        created_at: row.get("created_at"),
        author_id: row.get("author_id"),
        post_id: row.get("post_id"),
    }
}
