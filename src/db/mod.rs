//! Database layer
//!
//! Storage for accounts, teams, sessions and the training log. Supports:
//! - SQLite (default, single file or in-memory)
//! - MySQL
//!
//! The database driver is selected based on configuration.
//!
//! # Architecture
//!
//! The `DatabasePool` trait hides the backend from the services. Repositories
//! hold a `DynDatabasePool` and dispatch on [`DatabasePool::driver`] to
//! per-backend query functions.
//!
//! # Usage
//!
//! ```ignore
//! use crw::config::DatabaseConfig;
//! use crw::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, mysql_pool, sqlite_pool, DatabasePool, DynDatabasePool,
    MysqlDatabase, SqliteDatabase,
};
