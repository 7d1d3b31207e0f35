//! User repository
//!
//! Database operations for users and their team standing.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::User;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email (exact, case-sensitive match)
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Set team membership and coach flag; `None` for both leaves the team
    async fn set_team(&self, id: i64, team_id: Option<i64>, coach: Option<bool>) -> Result<()>;

    /// Set the coach flag, keeping the team
    async fn set_coach(&self, id: i64, coach: bool) -> Result<()>;

    /// Count the coaches of a team
    async fn count_coaches(&self, team_id: i64) -> Result<i64>;

    /// List the members of a team, ordered by email
    async fn list_by_team(&self, team_id: i64) -> Result<Vec<User>>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(sqlite_pool(&self.pool)?, user).await,
            DatabaseDriver::Mysql => create_user_mysql(mysql_pool(&self.pool)?, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_id_sqlite(sqlite_pool(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_user_by_id_mysql(mysql_pool(&self.pool)?, id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_email_sqlite(sqlite_pool(&self.pool)?, email).await
            }
            DatabaseDriver::Mysql => get_user_by_email_mysql(mysql_pool(&self.pool)?, email).await,
        }
    }

    async fn set_team(&self, id: i64, team_id: Option<i64>, coach: Option<bool>) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_team_sqlite(sqlite_pool(&self.pool)?, id, team_id, coach).await
            }
            DatabaseDriver::Mysql => {
                set_team_mysql(mysql_pool(&self.pool)?, id, team_id, coach).await
            }
        }
    }

    async fn set_coach(&self, id: i64, coach: bool) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => set_coach_sqlite(sqlite_pool(&self.pool)?, id, coach).await,
            DatabaseDriver::Mysql => set_coach_mysql(mysql_pool(&self.pool)?, id, coach).await,
        }
    }

    async fn count_coaches(&self, team_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_coaches_sqlite(sqlite_pool(&self.pool)?, team_id).await
            }
            DatabaseDriver::Mysql => count_coaches_mysql(mysql_pool(&self.pool)?, team_id).await,
        }
    }

    async fn list_by_team(&self, team_id: i64) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_users_by_team_sqlite(sqlite_pool(&self.pool)?, team_id).await
            }
            DatabaseDriver::Mysql => {
                list_users_by_team_mysql(mysql_pool(&self.pool)?, team_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, team_id, coach, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.team_id)
    .bind(user.coach)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        created_at: now,
        ..user.clone()
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, email, password_hash, team_id, coach, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, email, password_hash, team_id, coach, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn set_team_sqlite(
    pool: &SqlitePool,
    id: i64,
    team_id: Option<i64>,
    coach: Option<bool>,
) -> Result<()> {
    sqlx::query("UPDATE users SET team_id = ?, coach = ? WHERE id = ?")
        .bind(team_id)
        .bind(coach)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update user team")?;

    Ok(())
}

async fn set_coach_sqlite(pool: &SqlitePool, id: i64, coach: bool) -> Result<()> {
    sqlx::query("UPDATE users SET coach = ? WHERE id = ?")
        .bind(coach)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update coach status")?;

    Ok(())
}

async fn count_coaches_sqlite(pool: &SqlitePool, team_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users WHERE team_id = ? AND coach = 1")
        .bind(team_id)
        .fetch_one(pool)
        .await
        .context("Failed to count coaches")?;

    Ok(row.get("count"))
}

async fn list_users_by_team_sqlite(pool: &SqlitePool, team_id: i64) -> Result<Vec<User>> {
    let rows = sqlx::query(
        r#"
        SELECT id, email, password_hash, team_id, coach, created_at
        FROM users
        WHERE team_id = ?
        ORDER BY email
        "#,
    )
    .bind(team_id)
    .fetch_all(pool)
    .await
    .context("Failed to list team members")?;

    rows.iter().map(row_to_user_sqlite).collect()
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        team_id: row.try_get("team_id")?,
        coach: row.try_get("coach")?,
        created_at: row.try_get("created_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, team_id, coach, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.team_id)
    .bind(user.coach)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        created_at: now,
        ..user.clone()
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, email, password_hash, team_id, coach, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT id, email, password_hash, team_id, coach, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by email")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn set_team_mysql(
    pool: &MySqlPool,
    id: i64,
    team_id: Option<i64>,
    coach: Option<bool>,
) -> Result<()> {
    sqlx::query("UPDATE users SET team_id = ?, coach = ? WHERE id = ?")
        .bind(team_id)
        .bind(coach)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update user team")?;

    Ok(())
}

async fn set_coach_mysql(pool: &MySqlPool, id: i64, coach: bool) -> Result<()> {
    sqlx::query("UPDATE users SET coach = ? WHERE id = ?")
        .bind(coach)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update coach status")?;

    Ok(())
}

async fn count_coaches_mysql(pool: &MySqlPool, team_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users WHERE team_id = ? AND coach = TRUE")
        .bind(team_id)
        .fetch_one(pool)
        .await
        .context("Failed to count coaches")?;

    Ok(row.get("count"))
}

async fn list_users_by_team_mysql(pool: &MySqlPool, team_id: i64) -> Result<Vec<User>> {
    let rows = sqlx::query(
        r#"
        SELECT id, email, password_hash, team_id, coach, created_at
        FROM users
        WHERE team_id = ?
        ORDER BY email
        "#,
    )
    .bind(team_id)
    .fetch_all(pool)
    .await
    .context("Failed to list team members")?;

    rows.iter().map(row_to_user_mysql).collect()
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        team_id: row.try_get("team_id")?,
        coach: row.try_get("coach")?,
        created_at: row.try_get("created_at")?,
    })
}
