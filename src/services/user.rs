//! User service
//!
//! Account creation and credential checks:
//! - Email syntax validation and uniqueness
//! - Password hashing (Argon2id) and verification
//! - User lookups for the RPC layer

use crate::db::repositories::UserRepository;
use crate::models::User;
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// `local@domain.tld`: no whitespace and exactly one `@`
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex"));

/// Check whether an email address is syntactically valid
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Email address is malformed
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    /// Password is empty
    #[error("No password submitted")]
    EmptyPassword,

    /// Email address already registered
    #[error("There is already an account associated with {0}")]
    EmailTaken(String),

    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// User service for accounts and credentials
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
}

impl UserService {
    /// Create a new user service
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// - `InvalidEmail` if the email is not `local@domain.tld`
    /// - `EmptyPassword` if the password is empty
    /// - `EmailTaken` if the email is already registered (case-sensitive)
    /// - `Internal` for database errors
    pub async fn create_account(&self, email: &str, password: &str) -> Result<User, UserServiceError> {
        if !is_valid_email(email) {
            return Err(UserServiceError::InvalidEmail(email.to_string()));
        }
        if password.is_empty() {
            return Err(UserServiceError::EmptyPassword);
        }
        if self.email_exists(email).await? {
            return Err(UserServiceError::EmailTaken(email.to_string()));
        }

        let password_hash = hash_password(password).context("Failed to hash password")?;

        let user = match self.user_repo.create(&User::new(email.to_string(), password_hash)).await {
            Ok(user) => user,
            Err(e) => {
                // Lost a race against a concurrent registration of the same email
                if self.email_exists(email).await? {
                    return Err(UserServiceError::EmailTaken(email.to_string()));
                }
                return Err(UserServiceError::Internal(e.context("Failed to create user")));
            }
        };

        tracing::info!("Created account {}", user.id);
        Ok(user)
    }

    /// Check an email/password pair and return the matching user.
    ///
    /// Unknown emails and wrong passwords both yield `InvalidCredentials`.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to look up user")?
            .ok_or(UserServiceError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).context("Failed to verify password")? {
            return Err(UserServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_email(email)
            .await
            .context("Failed to check email")?
            .is_some())
    }
}
