//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session entity for user authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session key (32 alphanumeric characters)
    pub key: String,
    /// Associated user ID
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_expiration_check() {
        let now = Utc::now();

        let expired = Session {
            key: "expired".to_string(),
            user_id: 1,
            expires_at: now - Duration::hours(1),
            created_at: now - Duration::days(8),
        };
        let valid = Session {
            key: "valid".to_string(),
            user_id: 1,
            expires_at: now + Duration::hours(1),
            created_at: now,
        };

        assert!(expired.is_expired());
        assert!(!valid.is_expired());
    }
}
