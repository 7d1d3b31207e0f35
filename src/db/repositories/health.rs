//! Health data repository
//!
//! Daily health entries keyed by (user, date). Writes for an existing day
//! replace the stored values using the backend's native upsert.

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::HealthEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Health data repository trait
#[async_trait]
pub trait HealthRepository: Send + Sync {
    /// Insert the entry, or overwrite the one already stored for that day
    async fn upsert(&self, user_id: i64, entry: &HealthEntry) -> Result<()>;

    /// List entries dated on or after `since`, oldest first
    async fn list_since(&self, user_id: i64, since: NaiveDate) -> Result<Vec<HealthEntry>>;
}

/// SQLx-based health data repository implementation
pub struct SqlxHealthRepository {
    pool: DynDatabasePool,
}

impl SqlxHealthRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn HealthRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl HealthRepository for SqlxHealthRepository {
    async fn upsert(&self, user_id: i64, entry: &HealthEntry) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                upsert_health_sqlite(sqlite_pool(&self.pool)?, user_id, entry).await
            }
            DatabaseDriver::Mysql => {
                upsert_health_mysql(mysql_pool(&self.pool)?, user_id, entry).await
            }
        }
    }

    async fn list_since(&self, user_id: i64, since: NaiveDate) -> Result<Vec<HealthEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_health_since_sqlite(sqlite_pool(&self.pool)?, user_id, since).await
            }
            DatabaseDriver::Mysql => {
                list_health_since_mysql(mysql_pool(&self.pool)?, user_id, since).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn upsert_health_sqlite(pool: &SqlitePool, user_id: i64, entry: &HealthEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO health_data (user_id, date, resting_heart_rate, weight, comment)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id, date) DO UPDATE SET
            resting_heart_rate = excluded.resting_heart_rate,
            weight = excluded.weight,
            comment = excluded.comment
        "#,
    )
    .bind(user_id)
    .bind(entry.date)
    .bind(entry.resting_heart_rate)
    .bind(entry.weight)
    .bind(&entry.comment)
    .execute(pool)
    .await
    .context("Failed to store health data")?;

    Ok(())
}

async fn list_health_since_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    since: NaiveDate,
) -> Result<Vec<HealthEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT date, resting_heart_rate, weight, comment
        FROM health_data
        WHERE user_id = ? AND date >= ?
        ORDER BY date
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await
    .context("Failed to list health data")?;

    rows.iter().map(row_to_health_sqlite).collect()
}

fn row_to_health_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<HealthEntry> {
    let comment: Option<String> = row.try_get("comment")?;
    Ok(HealthEntry {
        date: row.try_get("date")?,
        resting_heart_rate: row.try_get("resting_heart_rate")?,
        weight: row.try_get("weight")?,
        comment: comment.unwrap_or_default(),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn upsert_health_mysql(pool: &MySqlPool, user_id: i64, entry: &HealthEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO health_data (user_id, date, resting_heart_rate, weight, comment)
        VALUES (?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            resting_heart_rate = VALUES(resting_heart_rate),
            weight = VALUES(weight),
            comment = VALUES(comment)
        "#,
    )
    .bind(user_id)
    .bind(entry.date)
    .bind(entry.resting_heart_rate)
    .bind(entry.weight)
    .bind(&entry.comment)
    .execute(pool)
    .await
    .context("Failed to store health data")?;

    Ok(())
}

async fn list_health_since_mysql(
    pool: &MySqlPool,
    user_id: i64,
    since: NaiveDate,
) -> Result<Vec<HealthEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT date, resting_heart_rate, weight, comment
        FROM health_data
        WHERE user_id = ? AND date >= ?
        ORDER BY date
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await
    .context("Failed to list health data")?;

    rows.iter().map(row_to_health_mysql).collect()
}

fn row_to_health_mysql(row: &sqlx::mysql::MySqlRow) -> Result<HealthEntry> {
    let comment: Option<String> = row.try_get("comment")?;
    Ok(HealthEntry {
        date: row.try_get("date")?,
        resting_heart_rate: row.try_get("resting_heart_rate")?,
        weight: row.try_get("weight")?,
        comment: comment.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxHealthRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        for id in [1_i64, 2] {
            sqlx::query("INSERT INTO users (id, email, password_hash) VALUES (?, ?, 'hash')")
                .bind(id)
                .bind(format!("user{}@example.com", id))
                .execute(pool.as_sqlite().unwrap())
                .await
                .unwrap();
        }
        SqlxHealthRepository::new(pool)
    }

    fn entry(day: u32, rate: i32, weight: i32, comment: &str) -> HealthEntry {
        HealthEntry {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            resting_heart_rate: rate,
            weight,
            comment: comment.to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_overwrites_same_day() {
        let repo = setup_test_repo().await;

        repo.upsert(1, &entry(10, 60, 80, "first")).await.unwrap();
        repo.upsert(1, &entry(10, 55, 79, "second")).await.unwrap();

        let all = repo
            .list_since(1, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(all, vec![entry(10, 55, 79, "second")]);
    }

    #[tokio::test]
    async fn test_entries_are_per_user() {
        let repo = setup_test_repo().await;
        repo.upsert(1, &entry(3, 50, 70, "")).await.unwrap();

        let since = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(repo.list_since(1, since).await.unwrap(), vec![entry(3, 50, 70, "")]);
        assert!(repo.list_since(2, since).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_since_filters_and_orders() {
        let repo = setup_test_repo().await;
        repo.upsert(1, &entry(20, 58, 80, "late")).await.unwrap();
        repo.upsert(1, &entry(5, 62, 81, "early")).await.unwrap();
        repo.upsert(1, &entry(15, 60, 80, "middle")).await.unwrap();
        repo.upsert(2, &entry(18, 45, 65, "other user")).await.unwrap();

        let since = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let found = repo.list_since(1, since).await.unwrap();

        let comments: Vec<_> = found.iter().map(|e| e.comment.as_str()).collect();
        assert_eq!(comments, vec!["middle", "late"]);
    }
}
