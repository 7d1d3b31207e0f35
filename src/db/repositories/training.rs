//! Training repository
//!
//! A training row owns its intervals through `intervals.training_id`. The
//! parent row and the interval rows are written by separate statements
//! without an enclosing transaction, so a failure part way leaves a training
//! with only some of its intervals.

use crate::config::DatabaseDriver;
use crate::db::{mysql_pool, sqlite_pool, DynDatabasePool};
use crate::models::{IntervalEntry, TrainingEntry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Training repository trait
#[async_trait]
pub trait TrainingRepository: Send + Sync {
    /// Store a training with its intervals, returning the training id
    async fn create(&self, user_id: i64, training: &TrainingEntry) -> Result<i64>;

    /// List trainings at or after `since`, oldest first, intervals in order
    async fn list_since(&self, user_id: i64, since: NaiveDateTime) -> Result<Vec<TrainingEntry>>;
}

/// SQLx-based training repository implementation
pub struct SqlxTrainingRepository {
    pool: DynDatabasePool,
}

impl SqlxTrainingRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TrainingRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TrainingRepository for SqlxTrainingRepository {
    async fn create(&self, user_id: i64, training: &TrainingEntry) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_training_sqlite(sqlite_pool(&self.pool)?, user_id, training).await
            }
            DatabaseDriver::Mysql => {
                create_training_mysql(mysql_pool(&self.pool)?, user_id, training).await
            }
        }
    }

    async fn list_since(&self, user_id: i64, since: NaiveDateTime) -> Result<Vec<TrainingEntry>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_training_since_sqlite(sqlite_pool(&self.pool)?, user_id, since).await
            }
            DatabaseDriver::Mysql => {
                list_training_since_mysql(mysql_pool(&self.pool)?, user_id, since).await
            }
        }
    }
}

const LIST_TRAINING_SQL: &str = r#"
    SELECT t.id, t.time, t.type_is_endurance, t.comment,
           i.duration, i.power, i.pace, i.rest
    FROM training t
    LEFT JOIN intervals i ON i.training_id = t.id
    WHERE t.user_id = ? AND t.time >= ?
    ORDER BY t.time, t.id, i.position
"#;

/// One row of the training/interval join
struct TrainingRow {
    id: i64,
    time: NaiveDateTime,
    type_is_endurance: bool,
    comment: Option<String>,
    interval: Option<IntervalEntry>,
}

/// Fold joined rows (already ordered by training) into entries
fn group_training_rows(rows: Vec<TrainingRow>) -> Vec<TrainingEntry> {
    let mut entries: Vec<TrainingEntry> = Vec::new();
    let mut last_id = None;

    for row in rows {
        if last_id != Some(row.id) {
            last_id = Some(row.id);
            entries.push(TrainingEntry {
                time: row.time,
                type_is_endurance: row.type_is_endurance,
                comment: row.comment.unwrap_or_default(),
                intervals: Vec::new(),
            });
        }
        if let (Some(interval), Some(entry)) = (row.interval, entries.last_mut()) {
            entry.intervals.push(interval);
        }
    }

    entries
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_training_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    training: &TrainingEntry,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO training (user_id, time, type_is_endurance, comment)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(training.time)
    .bind(training.type_is_endurance)
    .bind(&training.comment)
    .execute(pool)
    .await
    .context("Failed to create training")?;

    let training_id = result.last_insert_rowid();

    for (position, interval) in training.intervals.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO intervals (training_id, position, duration, power, pace, rest)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(training_id)
        .bind(position as i64)
        .bind(interval.duration)
        .bind(interval.power)
        .bind(interval.pace)
        .bind(interval.rest)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to store interval {} of training {}", position, training_id))?;
    }

    Ok(training_id)
}

async fn list_training_since_sqlite(
    pool: &SqlitePool,
    user_id: i64,
    since: NaiveDateTime,
) -> Result<Vec<TrainingEntry>> {
    let rows = sqlx::query(LIST_TRAINING_SQL)
        .bind(user_id)
        .bind(since)
        .fetch_all(pool)
        .await
        .context("Failed to list training data")?;

    let rows = rows
        .iter()
        .map(row_to_training_sqlite)
        .collect::<Result<Vec<_>>>()?;
    Ok(group_training_rows(rows))
}

fn row_to_training_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<TrainingRow> {
    let duration: Option<i32> = row.try_get("duration")?;
    let interval = match duration {
        Some(duration) => Some(IntervalEntry {
            duration,
            power: row.try_get("power")?,
            pace: row.try_get("pace")?,
            rest: row.try_get("rest")?,
        }),
        None => None,
    };

    Ok(TrainingRow {
        id: row.try_get("id")?,
        time: row.try_get("time")?,
        type_is_endurance: row.try_get("type_is_endurance")?,
        comment: row.try_get("comment")?,
        interval,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_training_mysql(
    pool: &MySqlPool,
    user_id: i64,
    training: &TrainingEntry,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO training (user_id, time, type_is_endurance, comment)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(training.time)
    .bind(training.type_is_endurance)
    .bind(&training.comment)
    .execute(pool)
    .await
    .context("Failed to create training")?;

    let training_id = result.last_insert_id() as i64;

    for (position, interval) in training.intervals.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO intervals (training_id, position, duration, power, pace, rest)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(training_id)
        .bind(position as i32)
        .bind(interval.duration)
        .bind(interval.power)
        .bind(interval.pace)
        .bind(interval.rest)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to store interval {} of training {}", position, training_id))?;
    }

    Ok(training_id)
}

async fn list_training_since_mysql(
    pool: &MySqlPool,
    user_id: i64,
    since: NaiveDateTime,
) -> Result<Vec<TrainingEntry>> {
    let rows = sqlx::query(LIST_TRAINING_SQL)
        .bind(user_id)
        .bind(since)
        .fetch_all(pool)
        .await
        .context("Failed to list training data")?;

    let rows = rows
        .iter()
        .map(row_to_training_mysql)
        .collect::<Result<Vec<_>>>()?;
    Ok(group_training_rows(rows))
}

fn row_to_training_mysql(row: &sqlx::mysql::MySqlRow) -> Result<TrainingRow> {
    let duration: Option<i32> = row.try_get("duration")?;
    let interval = match duration {
        Some(duration) => Some(IntervalEntry {
            duration,
            power: row.try_get("power")?,
            pace: row.try_get("pace")?,
            rest: row.try_get("rest")?,
        }),
        None => None,
    };

    Ok(TrainingRow {
        id: row.try_get("id")?,
        time: row.try_get("time")?,
        type_is_endurance: row.try_get("type_is_endurance")?,
        comment: row.try_get("comment")?,
        interval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::NaiveDate;

    async fn setup_test_repo() -> SqlxTrainingRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        sqlx::query("INSERT INTO users (id, email, password_hash) VALUES (1, 'a@b.com', 'hash')")
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        SqlxTrainingRepository::new(pool)
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn interval(duration: i32, pace: Option<i32>) -> IntervalEntry {
        IntervalEntry {
            duration,
            power: 200,
            pace,
            rest: 60,
        }
    }

    #[tokio::test]
    async fn test_create_and_list_training() {
        let repo = setup_test_repo().await;
        let training = TrainingEntry {
            time: at(3, 7),
            type_is_endurance: false,
            comment: "4x500m".to_string(),
            intervals: vec![
                interval(95, Some(95)),
                interval(96, None),
                interval(94, Some(94)),
            ],
        };

        let id = repo.create(1, &training).await.unwrap();
        assert!(id > 0);

        let found = repo.list_since(1, at(1, 0)).await.unwrap();
        assert_eq!(found, vec![training]);
    }

    #[tokio::test]
    async fn test_list_since_orders_by_time() {
        let repo = setup_test_repo().await;
        for (day, comment) in [(9, "last"), (2, "too old"), (5, "first")] {
            let training = TrainingEntry {
                time: at(day, 18),
                type_is_endurance: true,
                comment: comment.to_string(),
                intervals: vec![interval(1800, None)],
            };
            repo.create(1, &training).await.unwrap();
        }

        let found = repo.list_since(1, at(4, 0)).await.unwrap();
        let comments: Vec<_> = found.iter().map(|t| t.comment.as_str()).collect();
        assert_eq!(comments, vec!["first", "last"]);
        assert!(found.iter().all(|t| t.intervals.len() == 1));
    }

    #[test]
    fn test_group_rows_without_intervals() {
        let rows = vec![TrainingRow {
            id: 1,
            time: at(1, 6),
            type_is_endurance: true,
            comment: None,
            interval: None,
        }];

        let grouped = group_training_rows(rows);
        assert_eq!(grouped.len(), 1);
        assert!(grouped[0].intervals.is_empty());
        assert_eq!(grouped[0].comment, "");
    }
}
