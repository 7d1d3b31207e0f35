//! Session manager
//!
//! Issues, verifies, renews and revokes session keys. A key is 32 characters
//! drawn from `[A-Za-z0-9]` by a cryptographically secure RNG and is valid
//! until its expiration time, which every authenticated call pushes forward
//! by the configured lifespan. A user may hold several valid keys at once.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::Session;
use anyhow::{anyhow, Context};
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;

/// Default session lifespan in days
pub const DEFAULT_SESSION_LIFESPAN_DAYS: i64 = 7;

/// Length of a session key in characters
pub const SESSION_KEY_LENGTH: usize = 32;

/// Error types for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No user with this id
    #[error("No user with id={0} exists")]
    UserNotFound(i64),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Generate a random session key
pub fn generate_session_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Session manager backed by the sessions table
pub struct SessionManager {
    session_repo: Arc<dyn SessionRepository>,
    user_repo: Arc<dyn UserRepository>,
    lifespan_days: i64,
}

impl SessionManager {
    /// Create a session manager with the default one week lifespan
    pub fn new(
        session_repo: Arc<dyn SessionRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self::with_lifespan(session_repo, user_repo, DEFAULT_SESSION_LIFESPAN_DAYS)
    }

    /// Create a session manager with a custom lifespan in days
    pub fn with_lifespan(
        session_repo: Arc<dyn SessionRepository>,
        user_repo: Arc<dyn UserRepository>,
        lifespan_days: i64,
    ) -> Self {
        Self {
            session_repo,
            user_repo,
            lifespan_days,
        }
    }

    /// Issue a new session key for a user.
    ///
    /// The user's already expired sessions are purged first. Key collisions
    /// are not checked for.
    pub async fn issue(&self, user_id: i64) -> Result<String, SessionError> {
        if self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to look up session owner")?
            .is_none()
        {
            return Err(SessionError::UserNotFound(user_id));
        }

        let now = Utc::now();
        let purged = self
            .session_repo
            .delete_expired_by_user(user_id, now)
            .await
            .context("Failed to purge expired sessions")?;
        if purged > 0 {
            tracing::debug!("Purged {} expired sessions of user {}", purged, user_id);
        }

        let session = Session {
            key: generate_session_key(),
            user_id,
            expires_at: self.expiry_from(now)?,
            created_at: now,
        };
        self.session_repo
            .create(&session)
            .await
            .context("Failed to store session")?;

        Ok(session.key)
    }

    /// True iff `key` belongs to `user_id` and has not expired
    pub async fn verify(&self, user_id: i64, key: &str) -> Result<bool, SessionError> {
        let session = self
            .session_repo
            .get_by_key(key)
            .await
            .context("Failed to look up session")?;

        Ok(matches!(session, Some(s) if s.user_id == user_id && !s.is_expired()))
    }

    /// Push the expiration of the matching session one lifespan past now.
    ///
    /// Does nothing when no session matches both user and key.
    pub async fn renew(&self, user_id: i64, key: &str) -> Result<(), SessionError> {
        let renewed = self
            .session_repo
            .renew(user_id, key, self.expiry_from(Utc::now())?)
            .await
            .context("Failed to renew session")?;
        if renewed > 0 {
            tracing::debug!("Renewed session of user {}", user_id);
        }
        Ok(())
    }

    /// Expiration of a session issued or renewed at `now`
    fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, SessionError> {
        Duration::try_days(self.lifespan_days)
            .and_then(|lifespan| now.checked_add_signed(lifespan))
            .ok_or_else(|| {
                anyhow!("Session lifespan of {} days is out of range", self.lifespan_days).into()
            })
    }

    /// Delete a session key (logout)
    pub async fn revoke(&self, key: &str) -> Result<(), SessionError> {
        self.session_repo
            .delete(key)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Owner of a session key, whether or not it has expired
    pub async fn resolve_user_id_by_key(&self, key: &str) -> Result<Option<i64>, SessionError> {
        let session = self
            .session_repo
            .get_by_key(key)
            .await
            .context("Failed to look up session")?;
        Ok(session.map(|s| s.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::User;

    async fn setup_test_manager(lifespan_days: i64) -> (DynDatabasePool, SessionManager, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let user = user_repo
            .create(&User::new("kees@kmail.com".to_string(), "hash".to_string()))
            .await
            .unwrap();
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let manager = SessionManager::with_lifespan(session_repo, user_repo, lifespan_days);

        (pool, manager, user.id)
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(generate_session_key(), generate_session_key());
    }

    #[tokio::test]
    async fn test_issue_then_verify() {
        let (_pool, manager, user_id) = setup_test_manager(7).await;

        let key = manager.issue(user_id).await.unwrap();

        assert_eq!(key.len(), SESSION_KEY_LENGTH);
        assert!(manager.verify(user_id, &key).await.unwrap());
        assert!(!manager.verify(user_id + 1, &key).await.unwrap());
        assert!(!manager.verify(user_id, "not-a-key").await.unwrap());
    }

    #[tokio::test]
    async fn test_issue_for_unknown_user_fails() {
        let (_pool, manager, _) = setup_test_manager(7).await;
        let result = manager.issue(4242).await;
        assert!(matches!(result, Err(SessionError::UserNotFound(4242))));
    }

    #[tokio::test]
    async fn test_multiple_valid_sessions_per_user() {
        let (_pool, manager, user_id) = setup_test_manager(7).await;

        let first = manager.issue(user_id).await.unwrap();
        let second = manager.issue(user_id).await.unwrap();

        assert_ne!(first, second);
        assert!(manager.verify(user_id, &first).await.unwrap());
        assert!(manager.verify(user_id, &second).await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_invalidates_key() {
        let (_pool, manager, user_id) = setup_test_manager(7).await;
        let key = manager.issue(user_id).await.unwrap();

        manager.revoke(&key).await.unwrap();

        assert!(!manager.verify(user_id, &key).await.unwrap());
        assert_eq!(manager.resolve_user_id_by_key(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_key_fails_verification_and_is_purged() {
        // A negative lifespan issues keys that are already expired
        let (pool, manager, user_id) = setup_test_manager(-1).await;
        let stale = manager.issue(user_id).await.unwrap();
        assert!(!manager.verify(user_id, &stale).await.unwrap());
        assert_eq!(manager.resolve_user_id_by_key(&stale).await.unwrap(), Some(user_id));

        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let user_repo = SqlxUserRepository::boxed(pool);
        let manager = SessionManager::new(session_repo, user_repo);
        let fresh = manager.issue(user_id).await.unwrap();

        assert!(manager.verify(user_id, &fresh).await.unwrap());
        assert_eq!(manager.resolve_user_id_by_key(&stale).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_renew_extends_expired_session() {
        let (pool, manager, user_id) = setup_test_manager(-1).await;
        let key = manager.issue(user_id).await.unwrap();

        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let user_repo = SqlxUserRepository::boxed(pool);
        let manager = SessionManager::new(session_repo, user_repo);
        manager.renew(user_id, &key).await.unwrap();

        assert!(manager.verify(user_id, &key).await.unwrap());
    }

    #[tokio::test]
    async fn test_out_of_range_lifespan_is_an_error() {
        for days in [1_000_000_000, i64::MAX] {
            let (_pool, manager, user_id) = setup_test_manager(days).await;
            assert!(matches!(manager.issue(user_id).await, Err(SessionError::Internal(_))));
            assert!(matches!(manager.renew(user_id, "any").await, Err(SessionError::Internal(_))));
        }
    }

    #[tokio::test]
    async fn test_renew_unknown_key_is_noop() {
        let (_pool, manager, user_id) = setup_test_manager(7).await;
        manager.renew(user_id, "missing").await.unwrap();
    }

    mod property_tests {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            /// Every generated key is exactly 32 ASCII alphanumerics
            #[test]
            fn generated_key_alphabet(_seed in any::<u8>()) {
                let key = generate_session_key();
                prop_assert_eq!(key.len(), SESSION_KEY_LENGTH);
                prop_assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
            }
        }
    }
}
