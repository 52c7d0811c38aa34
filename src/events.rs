//! Events handed to external consumers after each state change.
//!
//! The engine only needs a publish-capable sink; topic naming, transport and
//! delivery guarantees belong to whoever implements `EventSink`.

use crate::config::EngineConfig;
use crate::error::PublishError;
use crate::types::{BestPrice, Side, Trade};
use chrono::{DateTime, Utc};
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The new top of book for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestPriceChanged {
    pub side: Side,
    pub price: Decimal,
    pub quantity: u64,
    pub timestamp: DateTime<Utc>,
}

impl BestPriceChanged {
    /// Builds the event from the freshly cached quote of `side`.
    pub fn new(side: Side, best: BestPrice) -> Self {
        Self {
            side,
            price: best.price,
            quantity: best.quantity,
            timestamp: best.timestamp,
        }
    }
}

/// Everything the engine publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookEvent {
    Trade(Trade),
    BestPriceChanged(BestPriceChanged),
    /// The last resting order on `side` is gone; there is no quote until one rests again
    BookSideEmptied { side: Side, timestamp: DateTime<Utc> },
}

/// Destination for book events.
///
/// `publish` is called while the book's write lock is held, so implementations
/// must return promptly and never wait on a downstream transport.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: BookEvent) -> Result<(), PublishError>;
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _event: BookEvent) -> Result<(), PublishError> {
        Ok(())
    }
}

/// Forwards events into a crossbeam channel without blocking.
///
/// With a bounded channel a full buffer rejects the event with
/// `PublishError::Full`; the book state stays authoritative either way.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: Sender<BookEvent>,
}

impl ChannelEventSink {
    /// A sink that never rejects an event while the receiver is alive.
    pub fn unbounded() -> (Self, Receiver<BookEvent>) {
        let (sender, receiver) = channel::unbounded();
        (Self { sender }, receiver)
    }

    /// A sink holding at most `capacity` undelivered events.
    ///
    /// Once full, `publish` fails with `PublishError::Full` instead of blocking.
    pub fn bounded(capacity: usize) -> (Self, Receiver<BookEvent>) {
        let (sender, receiver) = channel::bounded(capacity);
        (Self { sender }, receiver)
    }

    /// Builds the channel described by `event_channel_capacity`.
    pub fn from_config(config: &EngineConfig) -> (Self, Receiver<BookEvent>) {
        match config.event_channel_capacity {
            Some(capacity) => Self::bounded(capacity),
            None => Self::unbounded(),
        }
    }
}

impl EventSink for ChannelEventSink {
    fn publish(&self, event: BookEvent) -> Result<(), PublishError> {
        self.sender.try_send(event).map_err(|error| match error {
            TrySendError::Full(_) => PublishError::Full,
            TrySendError::Disconnected(_) => PublishError::Disconnected,
        })
    }
}
