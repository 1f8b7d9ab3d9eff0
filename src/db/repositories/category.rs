//! Category repository
//!
//! Categories are managed through privileged tooling rather than the public
//! web surface, so the repository carries the full CRUD set while the web
//! layer only reads.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Category, NewCategory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, input: &NewCategory) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// List published categories ordered by title (for post form choices)
    async fn list_published(&self) -> Result<Vec<Category>>;

    /// Delete a category; referencing posts keep their rows with a null
    /// category
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, input: &NewCategory) -> Result<Category> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_category_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_category_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_category_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_category_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_category_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_category_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list_published(&self) -> Result<Vec<Category>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_published_sqlite(self.pool.as_sqlite().unwrap()).await
            }
            DatabaseDriver::Mysql => list_published_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_category_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_category_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const CATEGORY_COLUMNS: &str = "id, title, description, slug, is_published, created_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_category_sqlite(pool: &SqlitePool, input: &NewCategory) -> Result<Category> {
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO categories (title, description, slug, is_published, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.slug)
    .bind(input.is_published)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_rowid(),
        title: input.title.clone(),
        description: input.description.clone(),
        slug: input.slug.clone(),
        is_published: input.is_published,
        created_at: now,
    })
}

async fn get_category_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by ID")?;

    Ok(row.map(|row| row_to_category_sqlite(&row)))
}

async fn get_category_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE slug = ?", CATEGORY_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by slug")?;

    Ok(row.map(|row| row_to_category_sqlite(&row)))
}

async fn list_published_sqlite(pool: &SqlitePool) -> Result<Vec<Category>> {
    let sql = format!(
        "SELECT {} FROM categories WHERE is_published = TRUE ORDER BY title",
        CATEGORY_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list published categories")?;

    Ok(rows.iter().map(row_to_category_sqlite).collect())
}

async fn delete_category_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;
    Ok(())
}

fn row_to_category_sqlite(row: &sqlx::sqlite::SqliteRow) -> Category {
    Category {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        slug: row.get("slug"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_category_mysql(pool: &MySqlPool, input: &NewCategory) -> Result<Category> {
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO categories (title, description, slug, is_published, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.slug)
    .bind(input.is_published)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_id() as i64,
        title: input.title.clone(),
        description: input.description.clone(),
        slug: input.slug.clone(),
        is_published: input.is_published,
        created_at: now,
    })
}

async fn get_category_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by ID")?;

    Ok(row.map(|row| row_to_category_mysql(&row)))
}

async fn get_category_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE slug = ?", CATEGORY_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by slug")?;

    Ok(row.map(|row| row_to_category_mysql(&row)))
}

async fn list_published_mysql(pool: &MySqlPool) -> Result<Vec<Category>> {
    let sql = format!(
        "SELECT {} FROM categories WHERE is_published = TRUE ORDER BY title",
        CATEGORY_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list published categories")?;

    Ok(rows.iter().map(row_to_category_mysql).collect())
}

async fn delete_category_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete category")?;
    Ok(())
}

fn row_to_category_mysql(row: &sqlx::mysql::MySqlRow) -> Category {
    Category {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        slug: row.get("slug"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}
