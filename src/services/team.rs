//! Team service
//!
//! Team creation and membership management. Every operation takes the
//! already authenticated caller and checks the authorization rules before
//! touching the store.

use crate::db::repositories::{TeamRepository, UserRepository};
use crate::models::{Team, TeamMember, User};
use crate::services::authz::{self, AccessDenied};
use anyhow::{anyhow, Context};
use std::sync::Arc;

/// Error types for team service operations
#[derive(Debug, thiserror::Error)]
pub enum TeamServiceError {
    /// Authorization rule refused the action
    #[error(transparent)]
    Denied(#[from] AccessDenied),

    /// No user with this email
    #[error("No user with email={0} exists")]
    UserNotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Team service for membership and coach management
pub struct TeamService {
    user_repo: Arc<dyn UserRepository>,
    team_repo: Arc<dyn TeamRepository>,
}

impl TeamService {
    /// Create a new team service with the given repositories
    pub fn new(user_repo: Arc<dyn UserRepository>, team_repo: Arc<dyn TeamRepository>) -> Self {
        Self {
            user_repo,
            team_repo,
        }
    }

    /// Create a team and make the caller its coach.
    ///
    /// A caller already in a team moves to the new one.
    pub async fn create_team(&self, caller: &User, name: &str) -> Result<Team, TeamServiceError> {
        let team = self
            .team_repo
            .create(name)
            .await
            .context("Failed to create team")?;

        self.user_repo
            .set_team(caller.id, Some(team.id), Some(true))
            .await
            .context("Failed to make creator coach")?;

        tracing::info!("User {} created team {}", caller.id, team.id);
        Ok(team)
    }

    /// Add a teamless user to the caller's team as a non-coach member
    pub async fn add_to_team(&self, caller: &User, email: &str) -> Result<(), TeamServiceError> {
        let standing = caller.membership();
        authz::require_in_team(&standing)?;
        authz::require_coach(&standing)?;

        let target = self.lookup(email).await?;
        let team_id = authz::can_add_to_team(&standing, &target.membership())?;

        self.user_repo
            .set_team(target.id, Some(team_id), Some(false))
            .await
            .context("Failed to add user to team")?;

        tracing::info!("User {} added user {} to team {}", caller.id, target.id, team_id);
        Ok(())
    }

    /// Remove a user from their team (self-removal or by a coach of that team)
    pub async fn remove_from_team(&self, caller: &User, email: &str) -> Result<(), TeamServiceError> {
        let target = self.lookup(email).await?;
        authz::can_remove_from_team(&caller.membership(), &target.membership())?;

        self.user_repo
            .set_team(target.id, None, None)
            .await
            .context("Failed to remove user from team")?;

        tracing::info!("User {} removed user {} from their team", caller.id, target.id);
        Ok(())
    }

    /// Set the coach flag of a member of the caller's team
    pub async fn set_coach_status(
        &self,
        caller: &User,
        email: &str,
        coach: bool,
    ) -> Result<(), TeamServiceError> {
        let standing = caller.membership();
        let team_id = authz::require_in_team(&standing)?;
        authz::require_coach(&standing)?;

        let target = self.lookup(email).await?;
        let coach_count = self
            .user_repo
            .count_coaches(team_id)
            .await
            .context("Failed to count coaches")?;
        authz::can_set_coach_status(&standing, &target.membership(), coach, coach_count)?;

        self.user_repo
            .set_coach(target.id, coach)
            .await
            .context("Failed to update coach status")?;

        tracing::info!("User {} set coach={} for user {}", caller.id, coach, target.id);
        Ok(())
    }

    /// The caller's team and its members ordered by email
    pub async fn team_info(&self, caller: &User) -> Result<(Team, Vec<TeamMember>), TeamServiceError> {
        let team_id = authz::require_in_team(&caller.membership())?;

        let team = self
            .team_repo
            .get_by_id(team_id)
            .await
            .context("Failed to get team")?
            .ok_or_else(|| anyhow!("Team {} of user {} does not exist", team_id, caller.id))?;

        let members = self
            .user_repo
            .list_by_team(team_id)
            .await
            .context("Failed to list team members")?
            .into_iter()
            .map(|u| TeamMember {
                user_id: u.id,
                coach: u.is_coach(),
                email: u.email,
            })
            .collect();

        Ok((team, members))
    }

    async fn lookup(&self, email: &str) -> Result<User, TeamServiceError> {
        self.user_repo
            .get_by_email(email)
            .await
            .context("Failed to look up user")?
            .ok_or_else(|| TeamServiceError::UserNotFound(email.to_string()))
    }
}
