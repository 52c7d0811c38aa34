use crate::error::OrderError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller-assigned order identity.
pub type OrderId = u64;

/// Represents the side of an order in the order book.
///
/// - `Buy` orders rest on the bid side
/// - `Sell` orders rest on the ask side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side: traders willing to purchase at a given price
    Buy,
    /// Sell side: traders willing to sell at a given price
    Sell,
}

impl Side {
    /// Returns the side an order of this side matches against.
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "bid"),
            Side::Sell => write!(f, "ask"),
        }
    }
}

/// The closed set of order types accepted by the engine.
///
/// Commands carry the type as a string; it is parsed once on admission and the
/// matching loop only ever sees this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Rests at its price if not fully filled
    Limit,
    /// Takes whatever liquidity exists, unfilled remainder is discarded
    Market,
}

impl FromStr for OrderType {
    type Err = OrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LIMIT" => Ok(OrderType::Limit),
            "MARKET" => Ok(OrderType::Market),
            other => Err(OrderError::InvalidOrder(format!(
                "unrecognized order type `{other}`"
            ))),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Market => write!(f, "MARKET"),
        }
    }
}

/// An order admitted into the engine.
///
/// Only `remaining_quantity` changes after admission, and only the matching
/// engine changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    /// Limit price (normalized); zero for market orders
    pub price: Decimal,
    pub remaining_quantity: u64,
    pub side: Side,
    pub order_type: OrderType,
    /// Position in the global admission order, used for time priority
    pub arrival_sequence: u64,
    pub timestamp: DateTime<Utc>,
    /// Resting orders past this instant are removed by the next expiry sweep
    pub expires_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Whether the order's time to live has elapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// An executed match between a resting (maker) order and an incoming (taker) order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Engine-assigned, starts at 1 and increases by one per trade
    pub trade_id: u64,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    /// Always the maker's price
    pub price: Decimal,
    pub quantity: u64,
    /// Side of the incoming order that triggered the match
    pub aggressor_side: Side,
    pub timestamp: DateTime<Utc>,
}

/// The `AddOrder` command as received from an external transport.
///
/// Fields are deliberately loose (signed quantity, string order type) so that
/// malformed input is reported as `InvalidOrder` instead of failing to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOrder {
    pub order_id: OrderId,
    pub price: Decimal,
    pub quantity: i64,
    pub side: Side,
    pub order_type: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl AddOrder {
    /// Creates a limit order command stamped with the current time.
    ///
    /// ## Examples
    ///
    /// ```
    /// use order_book_engine::{AddOrder, Decimal, Side};
    ///
    /// let command = AddOrder::limit(1, Decimal::new(1005, 1), 10, Side::Buy);
    /// assert_eq!(command.order_type, "LIMIT");
    /// ```
    pub fn limit(order_id: OrderId, price: Decimal, quantity: i64, side: Side) -> Self {
        Self {
            order_id,
            price,
            quantity,
            side,
            order_type: OrderType::Limit.to_string(),
            timestamp: Utc::now(),
            ttl_secs: None,
        }
    }

    /// Creates a market order command stamped with the current time.
    pub fn market(order_id: OrderId, quantity: i64, side: Side) -> Self {
        Self {
            order_id,
            price: Decimal::ZERO,
            quantity,
            side,
            order_type: OrderType::Market.to_string(),
            timestamp: Utc::now(),
            ttl_secs: None,
        }
    }

    /// Sets the time to live of the order, in seconds from its timestamp.
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = Some(ttl_secs);
        self
    }

    /// Overrides the command timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Changes requested for a resting order. `None` keeps the current value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AmendOrder {
    pub order_id: OrderId,
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
    pub side: Option<Side>,
}

/// Acknowledgement of an accepted command, echoing the validated order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: OrderId,
    pub price: Decimal,
    pub quantity: u64,
    pub side: Side,
    pub order_type: OrderType,
    pub timestamp: DateTime<Utc>,
}

/// What became of an order once its admission finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderState {
    /// Fully filled, nothing rests
    Filled,
    /// Rests in the book with this much left
    Resting { remaining: u64 },
    /// Market order remainder that found no liquidity and was dropped
    Discarded { unfilled: u64 },
}

/// Top-of-book quote for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestPrice {
    pub price: Decimal,
    /// Aggregate remaining quantity at the best level
    pub quantity: u64,
    /// When the best level last changed
    pub timestamp: DateTime<Utc>,
}

/// Aggregated view of one price level, for display and audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub price: Decimal,
    pub quantity: u64,
    pub order_count: usize,
}

/// Levels of both sides, each in priority order (best first).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub bids: Vec<LevelSummary>,
    pub asks: Vec<LevelSummary>,
}
