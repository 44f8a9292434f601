use icon_bus::BusError;
use iconservice::{errors, ServiceError};
use serde::Serialize;
use serde_json::Value;
use serde_with::skip_serializing_none;
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const TIMEOUT: i64 = -32006;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl RpcError {
    pub fn code(&self) -> i64 {
        match self {
            RpcError::Parse(_) => PARSE_ERROR,
            RpcError::InvalidRequest(_) => errors::INVALID_REQUEST,
            RpcError::InvalidParams(_) => errors::INVALID_PARAMS,
            RpcError::Service(e) => e.code(),
            RpcError::Bus(BusError::Timeout(_)) => TIMEOUT,
            RpcError::Bus(_) => errors::SERVER_ERROR,
        }
    }

    pub fn to_object(&self) -> ErrorObject {
        ErrorObject {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorObject {
    pub code: i64,
    pub message: String,
}

#[skip_serializing_none]
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    pub result: Option<Value>,
    pub error: Option<ErrorObject>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: &RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error.to_object()),
        }
    }
}

/// One response per request, or an array of them for a batch.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum RpcReply {
    Single(JsonRpcResponse),
    Batch(Vec<JsonRpcResponse>),
}
