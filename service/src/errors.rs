use icon_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;
pub const SERVER_ERROR: i64 = -32000;

/// Failures of a query. Travels back over the bus, so it stays plain data.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message")]
pub enum ServiceError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Invalid params: {0}")]
    InvalidParams(String),
    #[error("State of block height {0:#x} is not available")]
    StateUnavailable(u64),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn code(&self) -> i64 {
        use ServiceError::*;

        match self {
            InvalidRequest(_) => INVALID_REQUEST,
            MethodNotFound(_) => METHOD_NOT_FOUND,
            InvalidParams(_) => INVALID_PARAMS,
            StateUnavailable(_) | Storage(_) => SERVER_ERROR,
            Internal(_) => INTERNAL_ERROR,
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        ServiceError::Storage(e.to_string())
    }
}
