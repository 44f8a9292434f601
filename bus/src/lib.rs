#![deny(clippy::dbg_macro)]

//! In-process message bus between the RPC front end and the service.
//!
//! Requests travel over named queues owned by a [`Broker`]. Callers use an
//! [`RpcClient`], which owns a private reply queue and matches replies to
//! requests through a per-client correlation id. Delivery is at-most-once:
//! nothing is redelivered, and a reply that arrives after its caller gave up
//! is dropped.

pub mod broker;
pub mod rpc;

use std::time::Duration;
use thiserror::Error;

pub use broker::{Broker, Consumer};
pub use rpc::{reply, RpcClient};

pub type CorrelationId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub correlation_id: CorrelationId,
    pub reply_to: Option<String>,
    pub payload: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum BusError {
    #[error("Queue `{0}` does not exist")]
    NoSuchQueue(String),
    #[error("Queue `{0}` already has a consumer")]
    QueueExists(String),
    #[error("Queue `{0}` is closed")]
    QueueClosed(String),
    #[error("No reply within {0:?}")]
    Timeout(Duration),
    #[error("Reply channel dropped")]
    Disconnected,
    #[error("{0}")]
    Codec(#[from] serde_json::Error),
}
