//! Team model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Team entity. Members reference it through `users.team_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A member row as listed by `my_team_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: i64,
    pub email: String,
    pub coach: bool,
}
