//! Authorization rules
//!
//! Pure decisions over the team standing of the caller and, where relevant,
//! the target user. Nothing here touches the store; callers look up the
//! [`Membership`] values and the coach count first.

use crate::models::Membership;

/// Reason an action was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenied {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("The user is not a coach")]
    NotCoach,

    #[error("Coaches cannot do this")]
    IsCoach,

    #[error("The user is not in a team")]
    NotInTeam,

    #[error("The user is not permitted to do this")]
    NotPermitted,

    #[error("The last coach of a team cannot step down")]
    LastCoach,
}

pub fn require_authenticated(authenticated: bool) -> Result<(), AccessDenied> {
    if authenticated {
        Ok(())
    } else {
        Err(AccessDenied::NotAuthenticated)
    }
}

/// Caller must be in a team; returns that team's id
pub fn require_in_team(caller: &Membership) -> Result<i64, AccessDenied> {
    caller.team_id.ok_or(AccessDenied::NotInTeam)
}

/// Caller must coach the team they are in; returns that team's id
pub fn require_coach(caller: &Membership) -> Result<i64, AccessDenied> {
    match caller.team_id {
        Some(team_id) if caller.coach => Ok(team_id),
        _ => Err(AccessDenied::NotCoach),
    }
}

/// Coaches do not log health or training data
pub fn require_not_coach(caller: &Membership) -> Result<(), AccessDenied> {
    if caller.is_coach() {
        Err(AccessDenied::IsCoach)
    } else {
        Ok(())
    }
}

/// A coach may add a teamless user to their own team.
///
/// Returns the team the target joins.
pub fn can_add_to_team(caller: &Membership, target: &Membership) -> Result<i64, AccessDenied> {
    require_in_team(caller)?;
    let team_id = require_coach(caller)?;
    if target.team_id.is_some() {
        return Err(AccessDenied::NotPermitted);
    }
    Ok(team_id)
}

/// Users may leave their team; coaches may remove members of their own team.
pub fn can_remove_from_team(caller: &Membership, target: &Membership) -> Result<(), AccessDenied> {
    if caller.user_id == target.user_id {
        return Ok(());
    }
    if caller.is_coach() && caller.team_id == target.team_id {
        return Ok(());
    }
    Err(AccessDenied::NotPermitted)
}

/// A coach may change the coach flag of members of their own team.
///
/// `coach_count` is the number of coaches currently in the caller's team.
/// Only self-demotion of the sole coach is refused; demoting another coach
/// is allowed even when that leaves one coach.
pub fn can_set_coach_status(
    caller: &Membership,
    target: &Membership,
    coach: bool,
    coach_count: i64,
) -> Result<(), AccessDenied> {
    let team_id = require_in_team(caller)?;
    require_coach(caller)?;
    if target.team_id != Some(team_id) {
        return Err(AccessDenied::NotPermitted);
    }
    if !coach && target.user_id == caller.user_id && coach_count == 1 {
        return Err(AccessDenied::LastCoach);
    }
    Ok(())
}
