//! Data models
//!
//! Database entities of the training log service:
//! users, teams, sessions, health entries and trainings.

mod health;
mod session;
mod team;
mod training;
mod user;

pub use health::HealthEntry;
pub use session::Session;
pub use team::{Team, TeamMember};
pub use training::{IntervalEntry, TrainingEntry, TIME_FORMAT};
pub use user::{Membership, User};
