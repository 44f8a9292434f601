#![deny(clippy::dbg_macro)]

pub mod context;
pub mod errors;
pub mod score;
pub mod service;
pub mod types;

pub use context::QueryContext;
pub use errors::ServiceError;
pub use score::{IcxScore, Score};
pub use service::IconService;
pub use types::{Method, QueryResult, ServiceRequest, ServiceResponse};

pub const DEFAULT_CHANNEL: &str = "icon_dex";

/// Bus route the service consumes for `channel`.
pub fn route_name(channel: &str) -> String {
    format!("icon_score.{channel}")
}
