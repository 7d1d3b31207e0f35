//! User model
//!
//! A registered account. Team membership and the coach flag live on the user
//! row itself; both are unset for users without a team.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique, case-sensitive)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Team the user belongs to, if any
    pub team_id: Option<i64>,
    /// Coach flag within `team_id`; `None` outside a team
    pub coach: Option<bool>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new teamless user.
    ///
    /// Note: The password should already be hashed before calling this function.
    /// Use `services::password::hash_password()` to hash the password.
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            email,
            password_hash,
            team_id: None,
            coach: None,
            created_at: Utc::now(),
        }
    }

    /// Check if the user belongs to a team
    pub fn in_team(&self) -> bool {
        self.team_id.is_some()
    }

    /// Check if the user coaches the team they are in
    pub fn is_coach(&self) -> bool {
        self.team_id.is_some() && self.coach == Some(true)
    }

    /// Snapshot of the fields the authorization rules look at
    pub fn membership(&self) -> Membership {
        Membership {
            user_id: self.id,
            team_id: self.team_id,
            coach: self.coach.unwrap_or(false),
        }
    }
}

/// Team standing of a user, as seen by the authorization rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub user_id: i64,
    pub team_id: Option<i64>,
    pub coach: bool,
}

impl Membership {
    pub fn is_coach(&self) -> bool {
        self.team_id.is_some() && self.coach
    }
}
