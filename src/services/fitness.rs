//! Fitness service
//!
//! Health and training logs. Athletes write their own entries; coaches read
//! the entries of the non-coach members of their team. Date windows are
//! computed against the server's local calendar, matching the naive
//! timestamps stored in the log.

use crate::db::repositories::{HealthRepository, TrainingRepository, UserRepository};
use crate::models::{HealthEntry, TrainingEntry, User};
use crate::services::authz::{self, AccessDenied};
use anyhow::Context;
use chrono::{Days, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;

/// Error types for fitness service operations
#[derive(Debug, thiserror::Error)]
pub enum FitnessServiceError {
    /// Authorization rule refused the action
    #[error(transparent)]
    Denied(#[from] AccessDenied),

    /// Entry failed validation
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// First day included in a window reaching `days` back from `today`
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Fitness service for health and training data
pub struct FitnessService {
    user_repo: Arc<dyn UserRepository>,
    health_repo: Arc<dyn HealthRepository>,
    training_repo: Arc<dyn TrainingRepository>,
}

impl FitnessService {
    /// Create a new fitness service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        health_repo: Arc<dyn HealthRepository>,
        training_repo: Arc<dyn TrainingRepository>,
    ) -> Self {
        Self {
            user_repo,
            health_repo,
            training_repo,
        }
    }

    /// Store the caller's health entry for a day, replacing any earlier one
    pub async fn add_health_data(&self, caller: &User, entry: &HealthEntry) -> Result<(), FitnessServiceError> {
        authz::require_not_coach(&caller.membership())?;

        self.health_repo
            .upsert(caller.id, entry)
            .await
            .context("Failed to store health data")?;

        tracing::info!("User {} logged health data for {}", caller.id, entry.date);
        Ok(())
    }

    /// The caller's health entries of the last `days` days, oldest first
    pub async fn my_health_data(&self, caller: &User, days: u32) -> Result<Vec<HealthEntry>, FitnessServiceError> {
        Ok(self.health_since(caller.id, days).await?)
    }

    /// Health entries of every athlete in the caller's team, by email
    pub async fn team_health_data(
        &self,
        caller: &User,
        days: u32,
    ) -> Result<Vec<(String, Vec<HealthEntry>)>, FitnessServiceError> {
        let mut result = Vec::new();
        for athlete in self.coached_athletes(caller).await? {
            let entries = self.health_since(athlete.id, days).await?;
            result.push((athlete.email, entries));
        }
        Ok(result)
    }

    /// Store a training of the caller together with its intervals
    pub async fn add_training(&self, caller: &User, training: &TrainingEntry) -> Result<i64, FitnessServiceError> {
        authz::require_not_coach(&caller.membership())?;
        if training.intervals.is_empty() {
            return Err(FitnessServiceError::InvalidEntry(
                "A training needs at least one interval".to_string(),
            ));
        }

        let id = self
            .training_repo
            .create(caller.id, training)
            .await
            .context("Failed to store training")?;

        tracing::info!(
            "User {} logged training {} with {} intervals",
            caller.id,
            id,
            training.intervals.len()
        );
        Ok(id)
    }

    /// The caller's trainings of the last `days` days, oldest first
    pub async fn my_training_data(&self, caller: &User, days: u32) -> Result<Vec<TrainingEntry>, FitnessServiceError> {
        Ok(self.training_since(caller.id, days).await?)
    }

    /// Trainings of every athlete in the caller's team, by email
    pub async fn team_training_data(
        &self,
        caller: &User,
        days: u32,
    ) -> Result<Vec<(String, Vec<TrainingEntry>)>, FitnessServiceError> {
        let mut result = Vec::new();
        for athlete in self.coached_athletes(caller).await? {
            let entries = self.training_since(athlete.id, days).await?;
            result.push((athlete.email, entries));
        }
        Ok(result)
    }

    /// Non-coach members of the team the caller coaches, ordered by email
    async fn coached_athletes(&self, caller: &User) -> Result<Vec<User>, FitnessServiceError> {
        let standing = caller.membership();
        authz::require_in_team(&standing)?;
        let team_id = authz::require_coach(&standing)?;

        let members = self
            .user_repo
            .list_by_team(team_id)
            .await
            .context("Failed to list team members")?;
        Ok(members.into_iter().filter(|u| !u.is_coach()).collect())
    }

    async fn health_since(&self, user_id: i64, days: u32) -> anyhow::Result<Vec<HealthEntry>> {
        let since = window_start(Local::now().date_naive(), days);
        tracing::debug!("Reading health data of user {} since {}", user_id, since);
        self.health_repo
            .list_since(user_id, since)
            .await
            .context("Failed to read health data")
    }

    async fn training_since(&self, user_id: i64, days: u32) -> anyhow::Result<Vec<TrainingEntry>> {
        let since = NaiveDateTime::new(
            window_start(Local::now().date_naive(), days),
            NaiveTime::default(),
        );
        tracing::debug!("Reading training data of user {} since {}", user_id, since);
        self.training_repo
            .list_since(user_id, since)
            .await
            .context("Failed to read training data")
    }
}
