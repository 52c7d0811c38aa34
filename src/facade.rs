use crate::config::EngineConfig;
use crate::error::{EmptyBookSide, OrderError};
use crate::events::{BookEvent, EventSink, NoopEventSink};
use crate::matching_engine::MatchingEngine;
use crate::types::{
    AddOrder, AmendOrder, BestPrice, BookSnapshot, Order, OrderAck, OrderId, OrderState, Side,
    Trade,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use tracing::{instrument, warn};

/// What the caller of `submit_order` or `amend_order` gets back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReceipt {
    pub ack: OrderAck,
    pub trades: Vec<Trade>,
    pub state: OrderState,
}

/// The thread-safe entry point to one order book.
///
/// ### Thread Safety
///
/// The engine sits behind a single `RwLock`. Commands hold the write lock for
/// their whole run (validation, matching, resting, top-of-book refresh and
/// event publication), so commands are linearizable and no reader ever sees
/// a half-applied match. Queries share the read lock.
///
/// Events are handed to the sink before the write lock is released, so no
/// consumer can observe a trade before the submitting caller could.
pub struct OrderBookFacade {
    engine: RwLock<MatchingEngine>,
    sink: Arc<dyn EventSink>,
}

impl OrderBookFacade {
    /// Creates a facade whose events are dropped.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_event_sink(config, Arc::new(NoopEventSink))
    }

    /// Creates a facade publishing every trade and quote change to `sink`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use order_book_engine::{
    ///     AddOrder, BookEvent, ChannelEventSink, Decimal, EngineConfig, OrderBookFacade, Side,
    /// };
    /// use std::sync::Arc;
    ///
    /// let (sink, events) = ChannelEventSink::unbounded();
    /// let facade = OrderBookFacade::with_event_sink(EngineConfig::default(), Arc::new(sink));
    ///
    /// facade
    ///     .submit_order(AddOrder::limit(4, Decimal::new(14005, 1), 10, Side::Sell))
    ///     .unwrap();
    ///
    /// assert!(matches!(events.try_recv(), Ok(BookEvent::BestPriceChanged(_))));
    /// assert_eq!(facade.best_ask().unwrap().quantity, 10);
    /// assert!(facade.best_bid().is_err());
    /// ```
    pub fn with_event_sink(config: EngineConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            engine: RwLock::new(MatchingEngine::new(config)),
            sink,
        }
    }

    /// Admits a new order, returning its trades and final state.
    #[instrument(skip(self, command), fields(order_id = command.order_id))]
    pub fn submit_order(&self, command: AddOrder) -> Result<OrderReceipt, OrderError> {
        let mut engine = self.engine.write();
        let admission = engine.admit(command)?;
        self.publish(admission.events());

        Ok(OrderReceipt {
            ack: admission.ack,
            trades: admission.trades,
            state: admission.state,
        })
    }

    /// Removes a resting order and returns it.
    #[instrument(skip(self))]
    pub fn cancel_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        let mut engine = self.engine.write();
        let cancellation = engine.cancel(order_id)?;
        self.publish(cancellation.quote_changes);

        Ok(cancellation.order)
    }

    /// Amends a resting order; see `MatchingEngine::amend`.
    #[instrument(skip(self, amend), fields(order_id = amend.order_id))]
    pub fn amend_order(&self, amend: AmendOrder) -> Result<OrderReceipt, OrderError> {
        let mut engine = self.engine.write();
        let admission = engine.amend(amend)?;
        self.publish(admission.events());

        Ok(OrderReceipt {
            ack: admission.ack,
            trades: admission.trades,
            state: admission.state,
        })
    }

    /// Removes resting orders whose time to live elapsed at `now`.
    pub fn expire_orders(&self, now: DateTime<Utc>) -> Vec<Order> {
        let mut engine = self.engine.write();
        let expiry = engine.expire(now);
        self.publish(expiry.quote_changes);

        expiry.expired
    }

    /// Highest bid and its aggregate quantity, or `EmptyBookSide` when no bid rests.
    pub fn best_bid(&self) -> Result<BestPrice, EmptyBookSide> {
        self.engine.read().best(Side::Buy)
    }

    /// Lowest ask and its aggregate quantity, or `EmptyBookSide` when no ask rests.
    pub fn best_ask(&self) -> Result<BestPrice, EmptyBookSide> {
        self.engine.read().best(Side::Sell)
    }

    /// All levels of both sides with their aggregate quantities.
    pub fn snapshot(&self) -> BookSnapshot {
        self.engine.read().book().snapshot()
    }

    /// The best `max_levels` levels of each side.
    pub fn depth(&self, max_levels: usize) -> BookSnapshot {
        self.engine.read().book().depth(max_levels)
    }

    /// Every trade executed so far, oldest first.
    pub fn trade_log(&self) -> Vec<Trade> {
        self.engine.read().book().trade_log().to_vec()
    }

    /// A copy of a resting order, or `None` once it has filled, expired or been cancelled.
    pub fn resting_order(&self, order_id: OrderId) -> Option<Order> {
        self.engine.read().book().resting_order(order_id).cloned()
    }

    /// Best bid, best ask and the spread between them.
    pub fn spread(&self) -> (Option<Decimal>, Option<Decimal>, Option<Decimal>) {
        self.engine.read().book().compute_spread()
    }

    /// Hands events to the sink. Failures are logged; the book stays authoritative.
    fn publish(&self, events: impl IntoIterator<Item = BookEvent>) {
        for event in events {
            if let Err(error) = self.sink.publish(event) {
                warn!(%error, "event sink rejected book event");
            }
        }
    }
}

impl fmt::Debug for OrderBookFacade {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("OrderBookFacade")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
