//! Per-request authentication
//!
//! Every request gets its own [`AuthContext`], resolved from the `session`
//! and `user_id` members of the envelope before the method runs and dropped
//! when the call returns. Nothing about the caller is kept between requests.

use crate::services::{authz, SessionManager};

use super::error::RpcError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    /// Session key sent with the request, if any
    pub session: Option<String>,
    /// Effective caller id; `None` when it could not be determined
    pub user_id: Option<i64>,
    pub authenticated: bool,
}

impl AuthContext {
    /// Context of a request without credentials
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Resolve the caller of one request.
    ///
    /// With a session key, the effective user is the supplied `user_id` or,
    /// when none is given, the owner of the key. The caller is authenticated
    /// when the key is valid for that user, and the session is then renewed.
    pub async fn resolve(
        sessions: &SessionManager,
        session: Option<&str>,
        user_id: Option<i64>,
    ) -> Result<Self, RpcError> {
        let Some(key) = session else {
            return Ok(Self::anonymous());
        };

        let user_id = match user_id {
            Some(id) => Some(id),
            None => sessions.resolve_user_id_by_key(key).await?,
        };

        let authenticated = match user_id {
            Some(id) => sessions.verify(id, key).await?,
            None => false,
        };

        if let (true, Some(id)) = (authenticated, user_id) {
            sessions.renew(id, key).await?;
        }

        Ok(Self {
            session: Some(key.to_string()),
            user_id,
            authenticated,
        })
    }

    /// Id of the authenticated caller, or an authentication failure
    pub fn require(&self) -> Result<i64, RpcError> {
        authz::require_authenticated(self.authenticated)?;
        self.user_id.ok_or(RpcError::AuthenticationFailed)
    }
}
