//! RPC methods
//!
//! Each method extracts its parameters, then checks authentication, then
//! hands off to the services, which apply the authorization rules.

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use std::str::FromStr;

use crate::api::AppState;
use crate::models::{HealthEntry, IntervalEntry, TrainingEntry, User};
use crate::services::UserServiceError;

use super::context::AuthContext;
use super::error::RpcError;
use super::params::Params;

/// Methods exposed over RPC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Echo,
    CreateAccount,
    Login,
    UserStatus,
    Logout,
    LoggedIn,
    CreateTeam,
    AddToTeam,
    RemoveFromTeam,
    SetCoachStatus,
    MyTeamInfo,
    AddHealthData,
    GetMyHealthData,
    GetTeamHealthData,
    AddTraining,
    GetMyTrainingData,
    GetTeamTrainingData,
}

impl FromStr for Method {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "echo" => Method::Echo,
            "create_account" => Method::CreateAccount,
            "login" => Method::Login,
            "user_status" => Method::UserStatus,
            "logout" => Method::Logout,
            "logged_in" => Method::LoggedIn,
            "create_team" => Method::CreateTeam,
            "add_to_team" => Method::AddToTeam,
            "remove_from_team" => Method::RemoveFromTeam,
            "set_coach_status" => Method::SetCoachStatus,
            "my_team_info" => Method::MyTeamInfo,
            "add_health_data" => Method::AddHealthData,
            "get_my_health_data" => Method::GetMyHealthData,
            "get_team_health_data" => Method::GetTeamHealthData,
            "add_training" => Method::AddTraining,
            "get_my_training_data" => Method::GetMyTrainingData,
            "get_team_training_data" => Method::GetTeamTrainingData,
            _ => return Err(RpcError::MethodNotFound(s.to_string())),
        })
    }
}

/// Run one method call for an already resolved caller
pub async fn call(
    state: &AppState,
    method: Method,
    params: &Params,
    ctx: &AuthContext,
) -> Result<Value, RpcError> {
    match method {
        Method::Echo => {
            params.at_most(1)?;
            params.required::<Value>(0, "value")
        }

        Method::CreateAccount => {
            params.at_most(2)?;
            let email: String = params.required(0, "email")?;
            let password: String = params.required(1, "password")?;
            state.user_service.create_account(&email, &password).await?;
            Ok(json!(true))
        }

        Method::Login => {
            params.at_most(2)?;
            let email: String = params.required(0, "email")?;
            let password: String = params.required(1, "password")?;
            let user = match state.user_service.verify_credentials(&email, &password).await {
                Ok(user) => user,
                Err(UserServiceError::InvalidCredentials) => {
                    tracing::warn!("Rejected login attempt");
                    return Err(RpcError::InvalidCredentials);
                }
                Err(e) => return Err(e.into()),
            };
            let key = state.session_manager.issue(user.id).await?;
            tracing::info!("User {} logged in", user.id);
            Ok(json!(key))
        }

        Method::UserStatus => {
            params.at_most(0)?;
            match current_user(state, ctx).await? {
                Some(user) => Ok(json!([true, user.in_team(), user.is_coach()])),
                None => Ok(json!([false, false, false])),
            }
        }

        Method::Logout => {
            params.at_most(0)?;
            let user_id = ctx.require()?;
            if let Some(key) = &ctx.session {
                state.session_manager.revoke(key).await?;
            }
            tracing::info!("User {} logged out", user_id);
            Ok(json!(true))
        }

        Method::LoggedIn => {
            params.at_most(0)?;
            match current_user(state, ctx).await? {
                Some(user) => Ok(json!([true, user.is_coach()])),
                None => Ok(json!([false, false])),
            }
        }

        Method::CreateTeam => {
            params.at_most(1)?;
            let team_name: String = params.required(0, "team_name")?;
            let caller = caller(state, ctx).await?;
            let team = state.team_service.create_team(&caller, &team_name).await?;
            Ok(json!(team.id))
        }

        Method::AddToTeam => {
            params.at_most(1)?;
            let email: String = params.required(0, "email")?;
            let caller = caller(state, ctx).await?;
            state.team_service.add_to_team(&caller, &email).await?;
            Ok(json!(true))
        }

        Method::RemoveFromTeam => {
            params.at_most(1)?;
            let email: String = params.required(0, "email")?;
            let caller = caller(state, ctx).await?;
            state.team_service.remove_from_team(&caller, &email).await?;
            Ok(json!(true))
        }

        Method::SetCoachStatus => {
            params.at_most(2)?;
            let email: String = params.required(0, "email")?;
            let coach: bool = params.required(1, "coach")?;
            let caller = caller(state, ctx).await?;
            state.team_service.set_coach_status(&caller, &email, coach).await?;
            Ok(json!(true))
        }

        Method::MyTeamInfo => {
            params.at_most(0)?;
            let caller = caller(state, ctx).await?;
            let (team, members) = state.team_service.team_info(&caller).await?;
            let mut info = vec![json!(team.id), json!(team.name)];
            info.extend(members.into_iter().map(|m| json!([m.email, m.coach])));
            Ok(Value::Array(info))
        }

        Method::AddHealthData => {
            params.at_most(4)?;
            let entry = HealthEntry {
                date: params.required::<NaiveDate>(0, "date")?,
                resting_heart_rate: params.required(1, "resting_heart_rate")?,
                weight: params.required(2, "weight")?,
                comment: params.required(3, "comment")?,
            };
            let caller = caller(state, ctx).await?;
            state.fitness_service.add_health_data(&caller, &entry).await?;
            Ok(json!(true))
        }

        Method::GetMyHealthData => {
            params.at_most(1)?;
            let days: u32 = params.required(0, "days_in_the_past")?;
            let caller = caller(state, ctx).await?;
            let entries = state.fitness_service.my_health_data(&caller, days).await?;
            Ok(json!(entries))
        }

        Method::GetTeamHealthData => {
            params.at_most(1)?;
            let days: u32 = params.required(0, "days_in_the_past")?;
            let caller = caller(state, ctx).await?;
            let data = state.fitness_service.team_health_data(&caller, days).await?;
            Ok(json!(data))
        }

        Method::AddTraining => {
            params.at_most(4)?;
            let training = TrainingEntry {
                time: params.required::<NaiveDateTime>(0, "time")?,
                type_is_endurance: params.required(1, "type_is_endurance")?,
                comment: params.required(2, "comment")?,
                intervals: params.intervals::<IntervalEntry>(3, "intervals")?,
            };
            let caller = caller(state, ctx).await?;
            state.fitness_service.add_training(&caller, &training).await?;
            Ok(json!(true))
        }

        Method::GetMyTrainingData => {
            params.at_most(1)?;
            let days: u32 = params.required(0, "days_in_the_past")?;
            let caller = caller(state, ctx).await?;
            let entries = state.fitness_service.my_training_data(&caller, days).await?;
            Ok(json!(entries))
        }

        Method::GetTeamTrainingData => {
            params.at_most(1)?;
            let days: u32 = params.required(0, "days_in_the_past")?;
            let caller = caller(state, ctx).await?;
            let data = state.fitness_service.team_training_data(&caller, days).await?;
            Ok(json!(data))
        }
    }
}

/// The authenticated caller, or an authentication failure
async fn caller(state: &AppState, ctx: &AuthContext) -> Result<User, RpcError> {
    current_user(state, ctx)
        .await?
        .ok_or(RpcError::AuthenticationFailed)
}

/// The authenticated caller, if any
async fn current_user(state: &AppState, ctx: &AuthContext) -> Result<Option<User>, RpcError> {
    if !ctx.authenticated {
        return Ok(None);
    }
    match ctx.user_id {
        Some(id) => Ok(state.user_service.get_by_id(id).await?),
        None => Ok(None),
    }
}
