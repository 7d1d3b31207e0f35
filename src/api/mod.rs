//! API layer - HTTP transport and routing
//!
//! A single JSON-RPC endpoint, served on `/rpc` and on the root path.

pub mod rpc;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::post,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::repositories::{
    SqlxHealthRepository, SqlxSessionRepository, SqlxTeamRepository, SqlxTrainingRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{FitnessService, SessionManager, TeamService, UserService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub session_manager: Arc<SessionManager>,
    pub team_service: Arc<TeamService>,
    pub fitness_service: Arc<FitnessService>,
}

impl AppState {
    /// Wire repositories and services on top of a migrated pool
    pub fn new(pool: DynDatabasePool, session_lifespan_days: i64) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let team_repo = SqlxTeamRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let health_repo = SqlxHealthRepository::boxed(pool.clone());
        let training_repo = SqlxTrainingRepository::boxed(pool);

        Self {
            user_service: Arc::new(UserService::new(user_repo.clone())),
            session_manager: Arc::new(SessionManager::with_lifespan(
                session_repo,
                user_repo.clone(),
                session_lifespan_days,
            )),
            team_service: Arc::new(TeamService::new(user_repo.clone(), team_repo)),
            fitness_service: Arc::new(FitnessService::new(user_repo, health_repo, training_repo)),
        }
    }
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route("/rpc", post(rpc::rpc_handler))
        .route("/", post(rpc::rpc_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
