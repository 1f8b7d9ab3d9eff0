//! Location repository

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Location, NewLocation};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Location repository trait
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Create a new location
    async fn create(&self, input: &NewLocation) -> Result<Location>;

    /// Get location by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Location>>;

    /// List published locations ordered by name (for post form choices)
    async fn list_published(&self) -> Result<Vec<Location>>;

    /// Delete a location; referencing posts keep their rows with a null
    /// location
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based location repository implementation
pub struct SqlxLocationRepository {
    pool: DynDatabasePool,
}

impl SqlxLocationRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn LocationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl LocationRepository for SqlxLocationRepository {
    async fn create(&self, input: &NewLocation) -> Result<Location> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_location_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_location_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Location>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_location_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_location_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_published(&self) -> Result<Vec<Location>> {
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
                delete_location_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_location_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_location_sqlite(pool: &SqlitePool, input: &NewLocation) -> Result<Location> {
    let now = Utc::now();

    let result =
        sqlx::query("INSERT INTO locations (name, is_published, created_at) VALUES (?, ?, ?)")
            .bind(&input.name)
            .bind(input.is_published)
            .bind(now)
            .execute(pool)
            .await
            .context("Failed to create location")?;

    Ok(Location {
        id: result.last_insert_rowid(),
        name: input.name.clone(),
        is_published: input.is_published,
        created_at: now,
    })
}

async fn get_location_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Location>> {
    let row =
        sqlx::query("SELECT id, name, is_published, created_at FROM locations WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get location by ID")?;

    Ok(row.map(|row| row_to_location_sqlite(&row)))
}

async fn list_published_sqlite(pool: &SqlitePool) -> Result<Vec<Location>> {
    let rows = sqlx::query(
        "SELECT id, name, is_published, created_at FROM locations WHERE is_published = TRUE ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list published locations")?;

    Ok(rows.iter().map(row_to_location_sqlite).collect())
}

async fn delete_location_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM locations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete location")?;
    Ok(())
}

fn row_to_location_sqlite(row: &sqlx::sqlite::SqliteRow) -> Location {
    Location {
        id: row.get("id"),
        name: row.get("name"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_location_mysql(pool: &MySqlPool, input: &NewLocation) -> Result<Location> {
    let now = Utc::now();

    let result =
        sqlx::query("INSERT INTO locations (name, is_published, created_at) VALUES (?, ?, ?)")
            .bind(&input.name)
            .bind(input.is_published)
            .bind(now)
            .execute(pool)
            .await
            .context("Failed to create location")?;

    Ok(Location {
        id: result.last_insert_id() as i64,
        name: input.name.clone(),
        is_published: input.is_published,
        created_at: now,
    })
}

async fn get_location_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Location>> {
    let row =
        sqlx::query("SELECT id, name, is_published, created_at FROM locations WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("Failed to get location by ID")?;

    Ok(row.map(|row| row_to_location_mysql(&row)))
}

async fn list_published_mysql(pool: &MySqlPool) -> Result<Vec<Location>> {
    let rows = sqlx::query(
        "SELECT id, name, is_published, created_at FROM locations WHERE is_published = TRUE ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list published locations")?;

    Ok(rows.iter().map(row_to_location_mysql).collect())
}

async fn delete_location_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM locations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete location")?;
    Ok(())
}

fn row_to_location_mysql(row: &sqlx::mysql::MySqlRow) -> Location {
    Location {
        id: row.get("id"),
        name: row.get("name"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
    }
}
