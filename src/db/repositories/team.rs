//! Team repository
//!
//! Teams only carry a name; membership is stored on the user rows.

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::Team;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Team repository trait
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Create a new team
    async fn create(&self, name: &str) -> Result<Team>;

    /// Get team by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Team>>;
}

/// SQLx-based team repository implementation
pub struct SqlxTeamRepository {
    pool: DynDatabasePool,
}

impl SqlxTeamRepository {
    /// Create a new SQLx team repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TeamRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TeamRepository for SqlxTeamRepository {
    async fn create(&self, name: &str) -> Result<Team> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_team_sqlite(sqlite_pool(&self.pool)?, name).await,
            DatabaseDriver::Mysql => create_team_mysql(mysql_pool(&self.pool)?, name).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Team>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_team_by_id_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_team_by_id_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_team_sqlite(pool: &SqlitePool, name: &str) -> Result<Team> {
    let now = Utc::now();
    let result = sqlx::query("INSERT INTO teams (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create team")?;

    Ok(Team {
        id: result.last_insert_rowid(),
        name: name.to_string(),
        created_at: now,
    })
}

async fn get_team_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Team>> {
    let row = sqlx::query("SELECT id, name, created_at FROM teams WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get team by ID")?;

    match row {
        Some(row) => Ok(Some(Team {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })),
        None => Ok(None),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_team_mysql(pool: &MySqlPool, name: &str) -> Result<Team> {
    let now = Utc::now();
    let result = sqlx::query("INSERT INTO teams (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create team")?;

    Ok(Team {
        id: result.last_insert_id() as i64,
        name: name.to_string(),
        created_at: now,
    })
}

async fn get_team_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Team>> {
    let row = sqlx::query("SELECT id, name, created_at FROM teams WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get team by ID")?;

    match row {
        Some(row) => Ok(Some(Team {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })),
        None => Ok(None),
    }
}
