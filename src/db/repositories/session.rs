//! Session repository
//!
//! Database operations for session keys.
//!
//! This module provides:
//! - `SessionRepository` trait defining the interface for session data access
//! - `SqlxSessionRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::Session;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by key
    async fn get_by_key(&self, key: &str) -> Result<Option<Session>>;

    /// Move the expiration of the session matching both user and key.
    ///
    /// Returns the number of rows updated (0 when nothing matched).
    async fn renew(&self, user_id: i64, key: &str, expires_at: DateTime<Utc>) -> Result<u64>;

    /// Delete a session
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete the sessions of one user that expired before `now`
    async fn delete_expired_by_user(&self, user_id: i64, now: DateTime<Utc>) -> Result<i64>;
}

/// SQLx-based session repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    /// Create a new SQLx session repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_session_sqlite(sqlite_pool(&self.pool)?, session).await,
            DatabaseDriver::Mysql => create_session_mysql(mysql_pool(&self.pool)?, session).await,
        }
    }

    async fn get_by_key(&self, key: &str) -> Result<Option<Session>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_session_by_key_sqlite(sqlite_pool(&self.pool)?, key).await
            }
            DatabaseDriver::Mysql => get_session_by_key_mysql(mysql_pool(&self.pool)?, key).await,
        }
    }

    async fn renew(&self, user_id: i64, key: &str, expires_at: DateTime<Utc>) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                renew_session_sqlite(sqlite_pool(&self.pool)?, user_id, key, expires_at).await
            }
            DatabaseDriver::Mysql => {
                renew_session_mysql(mysql_pool(&self.pool)?, user_id, key, expires_at).await
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_session_sqlite(sqlite_pool(&self.pool)?, key).await,
            DatabaseDriver::Mysql => delete_session_mysql(mysql_pool(&self.pool)?, key).await,
        }
    }

    async fn delete_expired_by_user(&self, user_id: i64, now: DateTime<Utc>) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_expired_sessions_sqlite(sqlite_pool(&self.pool)?, user_id, now).await
            }
            DatabaseDriver::Mysql => {
                delete_expired_sessions_mysql(mysql_pool(&self.pool)?, user_id, now).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_session_sqlite(pool: &SqlitePool, session: &Session) -> Result<Session> {
    sqlx::query(
        r#"
        INSERT INTO sessions (session_key, user_id, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&session.key)
    .bind(session.user_id)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_by_key_sqlite(pool: &SqlitePool, key: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT session_key, user_id, expires_at, created_at
        FROM sessions
        WHERE session_key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by key")?;

    row.as_ref().map(row_to_session_sqlite).transpose()
}

async fn renew_session_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    key: &str,
    expires_at: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query("UPDATE sessions SET expires_at = ? WHERE user_id = ? AND session_key = ?")
        .bind(expires_at)
        .bind(user_id)
        .bind(key)
        .execute(pool)
        .await
        .context("Failed to renew session")?;

    Ok(result.rows_affected())
}

async fn delete_session_sqlite(pool: &SqlitePool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE session_key = ?")
        .bind(key)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

async fn delete_expired_sessions_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = ? AND expires_at < ?")
        .bind(user_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;

    Ok(result.rows_affected() as i64)
}

fn row_to_session_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Session> {
    Ok(Session {
        key: row.try_get("session_key")?,
        user_id: row.try_get("user_id")?,
        expires_at: row.try_get("expires_at")?,
        created_at: row.try_get("created_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_session_mysql(pool: &MySqlPool, session: &Session) -> Result<Session> {
    sqlx::query(
        r#"
        INSERT INTO sessions (session_key, user_id, expires_at, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&session.key)
    .bind(session.user_id)
    .bind(session.expires_at)
    .bind(session.created_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(session.clone())
}

async fn get_session_by_key_mysql(pool: &MySqlPool, key: &str) -> Result<Option<Session>> {
    let row = sqlx::query(
        r#"
        SELECT session_key, user_id, expires_at, created_at
        FROM sessions
        WHERE session_key = ?
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await
    .context("Failed to get session by key")?;

    row.as_ref().map(row_to_session_mysql).transpose()
}

async fn renew_session_mysql(
    pool: &MySqlPool,
    user_id: i64,
    key: &str,
    expires_at: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query("UPDATE sessions SET expires_at = ? WHERE user_id = ? AND session_key = ?")
        .bind(expires_at)
        .bind(user_id)
        .bind(key)
        .execute(pool)
        .await
        .context("Failed to renew session")?;

    Ok(result.rows_affected())
}

async fn delete_session_mysql(pool: &MySqlPool, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE session_key = ?")
        .bind(key)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}

async fn delete_expired_sessions_mysql(
    pool: &MySqlPool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = ? AND expires_at < ?")
        .bind(user_id)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to delete expired sessions")?;

    Ok(result.rows_affected() as i64)
}

fn row_to_session_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Session> {
    Ok(Session {
        key: row.try_get("session_key")?,
        user_id: row.try_get("user_id")?,
        expires_at: row.try_get("expires_at")?,
        created_at: row.try_get("created_at")?,
    })
}
