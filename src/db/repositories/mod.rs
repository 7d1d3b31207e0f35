//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for one relation.

pub mod health;
pub mod session;
pub mod team;
pub mod training;
pub mod user;

pub use health::{HealthRepository, SqlxHealthRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use team::{SqlxTeamRepository, TeamRepository};
pub use training::{SqlxTrainingRepository, TrainingRepository};
pub use user::{SqlxUserRepository, UserRepository};
