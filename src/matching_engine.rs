use crate::config::EngineConfig;
use crate::error::{EmptyBookSide, OrderError};
use crate::events::BookEvent;
use crate::order_book::OrderBook;
use crate::price_level::PriceLevel;
use crate::top_of_book::TopOfBookCache;
use crate::types::{
    AddOrder, AmendOrder, BestPrice, Order, OrderAck, OrderId, OrderState, OrderType, Side, Trade,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

/// Outcome of admitting (or re-admitting) an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub ack: OrderAck,
    /// Trades in execution order
    pub trades: Vec<Trade>,
    pub state: OrderState,
    /// `BestPriceChanged` / `BookSideEmptied` events, bid side first
    pub quote_changes: Vec<BookEvent>,
}

impl Admission {
    /// Events to publish: trades in execution order, then quote changes.
    pub fn events(&self) -> impl Iterator<Item = BookEvent> + '_ {
        self.trades
            .iter()
            .cloned()
            .map(BookEvent::Trade)
            .chain(self.quote_changes.iter().cloned())
    }
}

/// A resting order removed on request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
    pub order: Order,
    pub quote_changes: Vec<BookEvent>,
}

/// Orders removed by an expiry sweep.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Expiry {
    pub expired: Vec<Order>,
    pub quote_changes: Vec<BookEvent>,
}

/// Price-time priority matching over one `OrderBook`.
///
/// Each command runs to completion before returning: validation, the matching
/// loop, resting the remainder and refreshing the top-of-book cache. A command
/// that fails validation returns before touching any state.
///
/// The engine is not synchronized; `OrderBookFacade` serializes access to it.
#[derive(Debug)]
pub struct MatchingEngine {
    book: OrderBook,
    top_of_book: TopOfBookCache,
    config: EngineConfig,
}

impl MatchingEngine {
    /// Creates an engine over an empty book.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            book: OrderBook::new(),
            top_of_book: TopOfBookCache::new(),
            config,
        }
    }

    /// Read access to the underlying book.
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Cached best level of `side`.
    pub fn best(&self, side: Side) -> Result<BestPrice, EmptyBookSide> {
        self.top_of_book.best(side)
    }

    /// Validates a new order, matches it against the opposite side and rests
    /// any limit remainder.
    ///
    /// ## Examples
    ///
    /// ```
    /// use order_book_engine::{AddOrder, Decimal, EngineConfig, MatchingEngine, OrderState, Side};
    ///
    /// let mut engine = MatchingEngine::new(EngineConfig::default());
    /// engine.admit(AddOrder::limit(1, Decimal::new(1005, 1), 10, Side::Buy)).unwrap();
    ///
    /// let admission = engine
    ///     .admit(AddOrder::limit(3, Decimal::new(995, 1), 5, Side::Sell))
    ///     .unwrap();
    /// assert_eq!(admission.trades.len(), 1);
    /// assert_eq!(admission.trades[0].price, Decimal::new(1005, 1));
    /// assert_eq!(admission.state, OrderState::Filled);
    /// assert_eq!(engine.best(Side::Buy).unwrap().quantity, 5);
    /// ```
    pub fn admit(&mut self, command: AddOrder) -> Result<Admission, OrderError> {
        let order_type: OrderType = command.order_type.parse()?;
        let quantity = validate_quantity(command.quantity)?;
        let price = match order_type {
            OrderType::Limit => self.validate_price(command.price)?,
            OrderType::Market => Decimal::ZERO,
        };
        let expires_at = match order_type {
            OrderType::Limit => {
                let ttl_secs = command.ttl_secs.or(self.config.default_order_ttl_secs);
                ttl_secs
                    .map(|ttl_secs| expiry_after(command.timestamp, ttl_secs))
                    .transpose()?
            }
            OrderType::Market => None,
        };
        if self.book.is_known(command.order_id) {
            return Err(OrderError::DuplicateOrder(command.order_id));
        }
        if order_type == OrderType::Limit {
            self.ensure_level_capacity(command.side, price, quantity, None)?;
        }

        self.book.register_id(command.order_id);
        let order = Order {
            order_id: command.order_id,
            price,
            remaining_quantity: quantity,
            side: command.side,
            order_type,
            arrival_sequence: self.book.next_arrival_sequence(),
            timestamp: command.timestamp,
            expires_at,
        };
        debug!(
            order_id = order.order_id,
            side = %order.side,
            order_type = %order.order_type,
            price = %order.price,
            quantity = order.remaining_quantity,
            sequence = order.arrival_sequence,
            "admitting order"
        );

        Ok(self.execute(order))
    }

    /// Removes a resting order.
    pub fn cancel(&mut self, order_id: OrderId) -> Result<Cancellation, OrderError> {
        let order = self
            .book
            .unrest(order_id)
            .ok_or(OrderError::OrderNotFound(order_id))?;
        info!(
            order_id,
            remaining = order.remaining_quantity,
            "cancelled resting order"
        );

        let quote_changes = self.refresh_top_of_book(Utc::now());
        Ok(Cancellation {
            order,
            quote_changes,
        })
    }

    /// Changes price, quantity or side of a resting order.
    ///
    /// A quantity reduction at the same price and side is applied in place and
    /// keeps time priority. Anything else takes the order out of the book and
    /// re-admits it under the same id with a new arrival sequence, so it may
    /// trade immediately.
    pub fn amend(&mut self, amend: AmendOrder) -> Result<Admission, OrderError> {
        let current = self
            .book
            .resting_order(amend.order_id)
            .cloned()
            .ok_or(OrderError::OrderNotFound(amend.order_id))?;
        let price = match amend.price {
            Some(price) => self.validate_price(price)?,
            None => current.price,
        };
        let quantity = match amend.quantity {
            Some(quantity) => validate_quantity(quantity)?,
            None => current.remaining_quantity,
        };
        let side = amend.side.unwrap_or(current.side);
        self.ensure_level_capacity(side, price, quantity, Some(&current))?;
        let now = Utc::now();

        if price == current.price && side == current.side && quantity <= current.remaining_quantity
        {
            if quantity < current.remaining_quantity {
                self.book
                    .side_mut(side)
                    .reduce(current.order_id, price, quantity);
            }
            info!(
                order_id = current.order_id,
                from = current.remaining_quantity,
                to = quantity,
                "reduced resting order in place"
            );

            let ack = OrderAck {
                quantity,
                ..ack_for(&current)
            };
            return Ok(Admission {
                ack,
                trades: Vec::new(),
                state: OrderState::Resting {
                    remaining: quantity,
                },
                quote_changes: self.refresh_top_of_book(now),
            });
        }

        self.book.unrest(current.order_id);
        let order = Order {
            price,
            remaining_quantity: quantity,
            side,
            arrival_sequence: self.book.next_arrival_sequence(),
            timestamp: now,
            ..current
        };
        info!(
            order_id = order.order_id,
            side = %order.side,
            price = %order.price,
            quantity = order.remaining_quantity,
            "re-admitting amended order"
        );

        Ok(self.execute(order))
    }

    /// Removes every resting order whose time to live has elapsed at `now`.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Expiry {
        let mut expired = self.book.bids.remove_expired(now);
        expired.extend(self.book.asks.remove_expired(now));
        for order in &expired {
            self.book.resting.remove(&order.order_id);
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "expired resting orders");
        }

        let quote_changes = self.refresh_top_of_book(now);
        Expiry {
            expired,
            quote_changes,
        }
    }

    fn execute(&mut self, mut order: Order) -> Admission {
        let now = Utc::now();
        let ack = ack_for(&order);
        let trades = self.match_incoming(&mut order, now);

        let state = if order.remaining_quantity == 0 {
            OrderState::Filled
        } else {
            match order.order_type {
                OrderType::Limit => {
                    let remaining = order.remaining_quantity;
                    debug!(
                        order_id = order.order_id,
                        price = %order.price,
                        remaining,
                        "resting limit order"
                    );
                    self.book.rest(order);
                    OrderState::Resting { remaining }
                }
                OrderType::Market => {
                    warn!(
                        order_id = order.order_id,
                        unfilled = order.remaining_quantity,
                        "discarding unfilled market order remainder"
                    );
                    OrderState::Discarded {
                        unfilled: order.remaining_quantity,
                    }
                }
            }
        };

        let quote_changes = self.refresh_top_of_book(now);
        Admission {
            ack,
            trades,
            state,
            quote_changes,
        }
    }

    /// Runs the matching loop for `taker` against the opposite side.
    fn match_incoming(&mut self, taker: &mut Order, now: DateTime<Utc>) -> Vec<Trade> {
        let mut trades = Vec::new();

        while taker.remaining_quantity > 0 {
            let opposite = self.book.side_mut(taker.side.opposite());
            let Ok(level) = opposite.peek_best() else {
                break;
            };
            let maker_price = level.price();
            if !crosses(taker, maker_price) {
                break;
            }
            let Some(maker) = level.front() else {
                break;
            };
            let maker_order_id = maker.order_id;
            let fill_quantity = taker.remaining_quantity.min(maker.remaining_quantity);

            if let Some(exhausted) = opposite.consume(maker_price, fill_quantity) {
                self.book.resting.remove(&exhausted.order_id);
            }
            taker.remaining_quantity -= fill_quantity;

            let trade =
                self.book
                    .record_trade(taker, maker_order_id, maker_price, fill_quantity, now);
            debug!(
                trade_id = trade.trade_id,
                maker = maker_order_id,
                taker = taker.order_id,
                price = %maker_price,
                quantity = fill_quantity,
                "executed trade"
            );
            trades.push(trade);
        }

        trades
    }

    fn refresh_top_of_book(&mut self, now: DateTime<Utc>) -> Vec<BookEvent> {
        [Side::Buy, Side::Sell]
            .into_iter()
            .filter_map(|side| self.top_of_book.refresh(self.book.side(side), now))
            .collect()
    }

    /// Rejects an order whose resting remainder could push the aggregate
    /// quantity of its level past `u64::MAX`.
    ///
    /// `replacing` is the resting order an amend is about to take out of the
    /// book; its quantity does not count against the level.
    fn ensure_level_capacity(
        &self,
        side: Side,
        price: Decimal,
        quantity: u64,
        replacing: Option<&Order>,
    ) -> Result<(), OrderError> {
        let mut resting = self
            .book
            .side(side)
            .level(price)
            .map_or(0, PriceLevel::aggregate_quantity);
        if let Some(order) = replacing.filter(|order| order.side == side && order.price == price) {
            resting -= order.remaining_quantity;
        }

        match resting.checked_add(quantity) {
            Some(_) => Ok(()),
            None => Err(OrderError::InvalidOrder(format!(
                "quantity {quantity} would overflow the {side} level at {price} holding {resting}"
            ))),
        }
    }

    /// Checks a limit price and normalizes it so equal prices share one level.
    fn validate_price(&self, price: Decimal) -> Result<Decimal, OrderError> {
        if price <= Decimal::ZERO {
            return Err(OrderError::InvalidOrder(format!(
                "limit price must be positive, got {price}"
            )));
        }
        let price = price.normalize();
        if price.scale() > self.config.max_price_scale {
            return Err(OrderError::InvalidOrder(format!(
                "price {price} has more than {} decimal places",
                self.config.max_price_scale
            )));
        }
        Ok(price)
    }
}

/// Whether a resting level at `maker_price` can trade with `taker`.
fn crosses(taker: &Order, maker_price: Decimal) -> bool {
    match (taker.order_type, taker.side) {
        (OrderType::Market, _) => true,
        (OrderType::Limit, Side::Buy) => maker_price <= taker.price,
        (OrderType::Limit, Side::Sell) => maker_price >= taker.price,
    }
}

fn validate_quantity(quantity: i64) -> Result<u64, OrderError> {
    u64::try_from(quantity)
        .ok()
        .filter(|&quantity| quantity > 0)
        .ok_or_else(|| {
            OrderError::InvalidOrder(format!("quantity must be positive, got {quantity}"))
        })
}

fn expiry_after(timestamp: DateTime<Utc>, ttl_secs: u64) -> Result<DateTime<Utc>, OrderError> {
    if ttl_secs == 0 {
        return Err(OrderError::InvalidOrder(
            "time to live must be positive".to_string(),
        ));
    }
    i64::try_from(ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| timestamp.checked_add_signed(ttl))
        .ok_or_else(|| OrderError::InvalidOrder(format!("time to live {ttl_secs}s is out of range")))
}

fn ack_for(order: &Order) -> OrderAck {
    OrderAck {
        order_id: order.order_id,
        price: order.price,
        quantity: order.remaining_quantity,
        side: order.side,
        order_type: order.order_type,
        timestamp: order.timestamp,
    }
}
