//! JSON-RPC 2.0 endpoint
//!
//! The request body is read as text and parsed here so that malformed JSON
//! still gets a JSON-RPC error response. Batches run sequentially, each
//! element with its own [`AuthContext`].

pub mod context;
pub mod envelope;
pub mod error;
pub mod methods;
pub mod params;

#[cfg(test)]
mod tests;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::FutureExt;
use serde_json::{json, Value};
use std::panic::AssertUnwindSafe;

use crate::api::AppState;

pub use context::AuthContext;
pub use envelope::{RpcBody, RpcRequest, RpcResponse, JSONRPC_VERSION};
pub use error::RpcError;
pub use methods::Method;
pub use params::Params;

/// `POST /rpc`
pub async fn rpc_handler(State(state): State<AppState>, body: String) -> Response {
    match handle_body(&state, &body).await {
        Some(reply) => (StatusCode::OK, Json(reply)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Process a raw request body; `None` when there is nothing to send back
pub async fn handle_body(state: &AppState, body: &str) -> Option<Value> {
    match RpcBody::parse(body) {
        Err(err) => Some(to_value(RpcResponse::error(Value::Null, err))),
        Ok(RpcBody::Single(item)) => process(state, item).await.map(to_value),
        Ok(RpcBody::Batch(items)) => {
            let mut replies = Vec::with_capacity(items.len());
            for item in items {
                if let Some(reply) = process(state, item).await {
                    replies.push(to_value(reply));
                }
            }
            if replies.is_empty() {
                None
            } else {
                Some(Value::Array(replies))
            }
        }
    }
}

/// Run one request object. Notifications produce no response.
async fn process(state: &AppState, item: Value) -> Option<RpcResponse> {
    let request = match RpcRequest::from_value(item) {
        Ok(request) => request,
        Err(err) => return Some(RpcResponse::error(Value::Null, err)),
    };

    let outcome = AssertUnwindSafe(execute(state, &request))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            tracing::warn!("Method {} panicked", request.method);
            Err(RpcError::Internal)
        });

    if request.is_notification() {
        return None;
    }
    Some(RpcResponse::new(request.id.unwrap_or(Value::Null), outcome))
}

async fn execute(state: &AppState, request: &RpcRequest) -> Result<Value, RpcError> {
    let method: Method = request.method.parse()?;
    let params = Params::new(request.params.clone());

    let ctx = AuthContext::resolve(
        &state.session_manager,
        request.session.as_deref(),
        request.user_id,
    )
    .await?;

    tracing::debug!("Dispatching {:?} (authenticated: {})", method, ctx.authenticated);
    methods::call(state, method, &params, &ctx).await
}

fn to_value(response: RpcResponse) -> Value {
    let id = response.id.clone();
    serde_json::to_value(response).unwrap_or_else(|e| {
        tracing::warn!("Failed to serialize RPC response: {}", e);
        internal_error_value(id)
    })
}

/// Hand-built -32603 response, used when a response cannot be serialized
fn internal_error_value(id: Value) -> Value {
    let err = RpcError::Internal;
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "error": {"code": err.code(), "message": err.to_string()},
        "id": id,
    })
}
