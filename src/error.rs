//! Error taxonomy of the matching core.

use crate::types::{OrderId, Side};
use thiserror::Error;

/// Reasons a command is rejected. A rejected command leaves the book untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("duplicate order id {0}")]
    DuplicateOrder(OrderId),

    #[error("order {0} is not resting in the book")]
    OrderNotFound(OrderId),
}

/// No resting orders on the queried side, so there is no quote to report.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no resting orders on the {side} side")]
pub struct EmptyBookSide {
    pub side: Side,
}

/// Failure to hand an event to a sink.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    #[error("event channel is full")]
    Full,

    #[error("event channel is disconnected")]
    Disconnected,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
