//! JSON-RPC 2.0 envelope
//!
//! Request objects carry two extra members next to the standard ones:
//! `session` (a session key) and `user_id` (the id the key belongs to).

use serde::Serialize;
use serde_json::Value;

use super::error::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

/// A validated request object
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub method: String,
    pub params: Option<Value>,
    /// `None` marks a notification; `Some(Value::Null)` is an explicit null id
    pub id: Option<Value>,
    pub session: Option<String>,
    pub user_id: Option<i64>,
}

impl RpcRequest {
    /// Validate one element of the request body.
    ///
    /// `jsonrpc` may be omitted; when present it must be `"2.0"`.
    pub fn from_value(value: Value) -> Result<Self, RpcError> {
        let Value::Object(mut obj) = value else {
            return Err(RpcError::InvalidRequest("request must be an object".into()));
        };

        match obj.get("jsonrpc") {
            None => {}
            Some(Value::String(v)) if v == JSONRPC_VERSION => {}
            Some(_) => return Err(RpcError::InvalidRequest("unsupported jsonrpc version".into())),
        }

        let method = match obj.remove("method") {
            Some(Value::String(method)) => method,
            _ => return Err(RpcError::InvalidRequest("method must be a string".into())),
        };

        let params = match obj.remove("params") {
            None | Some(Value::Null) => None,
            Some(p @ (Value::Array(_) | Value::Object(_))) => Some(p),
            Some(_) => return Err(RpcError::InvalidRequest("params must be an array or object".into())),
        };

        let id = match obj.remove("id") {
            None => None,
            Some(id @ (Value::Null | Value::Number(_) | Value::String(_))) => Some(id),
            Some(_) => return Err(RpcError::InvalidRequest("id must be a number, string or null".into())),
        };

        let session = match obj.remove("session") {
            None | Some(Value::Null) => None,
            Some(Value::String(key)) => Some(key),
            Some(_) => return Err(RpcError::InvalidRequest("session must be a string".into())),
        };

        let user_id = match obj.remove("user_id") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => match n.as_i64() {
                Some(id) => Some(id),
                None => return Err(RpcError::InvalidRequest("user_id must be an integer".into())),
            },
            Some(_) => return Err(RpcError::InvalidRequest("user_id must be an integer".into())),
        };

        Ok(Self {
            method,
            params,
            id,
            session,
            user_id,
        })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Error member of a response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    Result(Value),
    Error(ErrorObject),
}

/// Response object; serializes to `{"jsonrpc", "result"|"error", "id"}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    #[serde(flatten)]
    pub payload: Payload,
    pub id: Value,
}

impl RpcResponse {
    pub fn new(id: Value, outcome: Result<Value, RpcError>) -> Self {
        let payload = match outcome {
            Ok(result) => Payload::Result(result),
            Err(err) => Payload::Error(ErrorObject {
                code: err.code(),
                message: err.to_string(),
            }),
        };
        Self {
            jsonrpc: JSONRPC_VERSION,
            payload,
            id,
        }
    }

    pub fn error(id: Value, err: RpcError) -> Self {
        Self::new(id, Err(err))
    }
}

/// Parsed request body: one request object or a batch
#[derive(Debug)]
pub enum RpcBody {
    Single(Value),
    Batch(Vec<Value>),
}

impl RpcBody {
    pub fn parse(body: &str) -> Result<Self, RpcError> {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(items)) if items.is_empty() => {
                Err(RpcError::InvalidRequest("empty batch".into()))
            }
            Ok(Value::Array(items)) => Ok(RpcBody::Batch(items)),
            Ok(value) => Ok(RpcBody::Single(value)),
            Err(_) => Err(RpcError::ParseError),
        }
    }
}
