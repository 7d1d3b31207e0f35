//! RPC error codes
//!
//! Application errors carry the numbered codes 1..=11 clients switch on.
//! Protocol errors use the reserved JSON-RPC 2.0 range.

use crate::services::{
    AccessDenied, FitnessServiceError, SessionError, TeamServiceError, UserServiceError,
};

/// Error returned from an RPC call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    #[error("There is already an account associated with this email")]
    AccountExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("No password submitted")]
    EmptyPassword,

    #[error("The user is not a coach")]
    NotCoach,

    #[error("The user is not permitted to do this")]
    NotPermitted,

    #[error("The user is not in a team")]
    NotInTeam,

    #[error("User does not exist")]
    UserNotFound,

    #[error("Coaches cannot do this")]
    IsCoach,

    #[error("The last coach of a team cannot step down")]
    LastCoach,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Mandatory argument missing: {0}")]
    MissingArgument(String),

    #[error("Parse error")]
    ParseError,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error")]
    Internal,
}

impl RpcError {
    /// Numeric code sent in the error object
    pub fn code(&self) -> i64 {
        match self {
            RpcError::AccountExists => 1,
            RpcError::InvalidCredentials => 2,
            RpcError::AuthenticationFailed => 3,
            RpcError::EmptyPassword => 4,
            RpcError::NotCoach | RpcError::NotPermitted => 5,
            RpcError::NotInTeam => 6,
            RpcError::UserNotFound => 7,
            RpcError::IsCoach => 8,
            RpcError::LastCoach => 9,
            RpcError::InvalidEmail => 10,
            RpcError::MissingArgument(_) => 11,
            RpcError::ParseError => -32700,
            RpcError::InvalidRequest(_) => -32600,
            RpcError::MethodNotFound(_) => -32601,
            RpcError::InvalidParams(_) => -32602,
            RpcError::Internal => -32603,
        }
    }

    fn internal(err: anyhow::Error) -> Self {
        tracing::warn!("Internal error during RPC call: {:#}", err);
        RpcError::Internal
    }
}

impl From<AccessDenied> for RpcError {
    fn from(denied: AccessDenied) -> Self {
        match denied {
            AccessDenied::NotAuthenticated => RpcError::AuthenticationFailed,
            AccessDenied::NotCoach => RpcError::NotCoach,
            AccessDenied::IsCoach => RpcError::IsCoach,
            AccessDenied::NotInTeam => RpcError::NotInTeam,
            AccessDenied::NotPermitted => RpcError::NotPermitted,
            AccessDenied::LastCoach => RpcError::LastCoach,
        }
    }
}

impl From<UserServiceError> for RpcError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::InvalidEmail(_) => RpcError::InvalidEmail,
            UserServiceError::EmptyPassword => RpcError::EmptyPassword,
            UserServiceError::EmailTaken(_) => RpcError::AccountExists,
            UserServiceError::InvalidCredentials => RpcError::InvalidCredentials,
            UserServiceError::Internal(e) => RpcError::internal(e),
        }
    }
}

impl From<SessionError> for RpcError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UserNotFound(_) => RpcError::UserNotFound,
            SessionError::Internal(e) => RpcError::internal(e),
        }
    }
}

impl From<TeamServiceError> for RpcError {
    fn from(err: TeamServiceError) -> Self {
        match err {
            TeamServiceError::Denied(denied) => denied.into(),
            TeamServiceError::UserNotFound(_) => RpcError::UserNotFound,
            TeamServiceError::Internal(e) => RpcError::internal(e),
        }
    }
}

impl From<FitnessServiceError> for RpcError {
    fn from(err: FitnessServiceError) -> Self {
        match err {
            FitnessServiceError::Denied(denied) => denied.into(),
            FitnessServiceError::InvalidEntry(msg) => RpcError::InvalidParams(msg),
            FitnessServiceError::Internal(e) => RpcError::internal(e),
        }
    }
}

impl From<anyhow::Error> for RpcError {
    fn from(err: anyhow::Error) -> Self {
        RpcError::internal(err)
    }
}
