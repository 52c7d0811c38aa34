use crate::book_side::BookSide;
use crate::price_level::PriceLevel;
use crate::types::{BookSnapshot, Order, OrderId, Side, Trade};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

/// The state of the book for one instrument.
///
/// This structure is responsible only for:
///
/// - Storing resting orders on the bid and ask sides
/// - Handing out arrival sequence numbers and trade ids
/// - Keeping the append-only trade log
/// - Indexing resting orders by id
///
/// It does not match orders; the `MatchingEngine` drives every mutation.
///
/// ### Order lookup
///
/// Orders live by value inside their level's queue. The `resting` index maps
/// an order id to its `(side, price)`, which is enough to find the level and
/// then the order, so nothing ever points back from an order to its level.
#[derive(Debug)]
pub struct OrderBook {
    /// Bid side (buy orders): best is the highest price
    pub(crate) bids: BookSide,
    /// Ask side (sell orders): best is the lowest price
    pub(crate) asks: BookSide,
    pub(crate) trade_log: Vec<Trade>,
    pub(crate) resting: HashMap<OrderId, (Side, Decimal)>,
    /// Every id ever admitted, resting or not
    known_ids: HashSet<OrderId>,
    next_arrival_sequence: u64,
    next_trade_id: u64,
}

impl OrderBook {
    /// Creates a new empty order book.
    ///
    /// ## Examples
    ///
    /// ```
    /// use order_book_engine::OrderBook;
    ///
    /// let order_book = OrderBook::new();
    /// assert_eq!(order_book.compute_spread(), (None, None, None));
    /// ```
    pub fn new() -> Self {
        OrderBook {
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            trade_log: Vec::new(),
            resting: HashMap::new(),
            known_ids: HashSet::new(),
            next_arrival_sequence: 1,
            next_trade_id: 1,
        }
    }

    /// Returns the bid or ask side.
    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub(crate) fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Whether `order_id` was ever admitted.
    pub fn is_known(&self, order_id: OrderId) -> bool {
        self.known_ids.contains(&order_id)
    }

    pub(crate) fn register_id(&mut self, order_id: OrderId) {
        self.known_ids.insert(order_id);
    }

    pub(crate) fn next_arrival_sequence(&mut self) -> u64 {
        let sequence = self.next_arrival_sequence;
        self.next_arrival_sequence += 1;
        sequence
    }

    /// Places an order on its own side and indexes it.
    pub(crate) fn rest(&mut self, order: Order) {
        self.resting.insert(order.order_id, (order.side, order.price));
        self.side_mut(order.side).insert(order);
    }

    /// Takes a resting order out of the book.
    pub(crate) fn unrest(&mut self, order_id: OrderId) -> Option<Order> {
        let (side, price) = self.resting.remove(&order_id)?;
        self.side_mut(side).remove(order_id, price)
    }

    /// Appends a trade to the log and returns it.
    pub(crate) fn record_trade(
        &mut self,
        taker: &Order,
        maker_order_id: OrderId,
        price: Decimal,
        quantity: u64,
        timestamp: DateTime<Utc>,
    ) -> Trade {
        let (buy_order_id, sell_order_id) = match taker.side {
            Side::Buy => (taker.order_id, maker_order_id),
            Side::Sell => (maker_order_id, taker.order_id),
        };
        let trade = Trade {
            trade_id: self.next_trade_id,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            aggressor_side: taker.side,
            timestamp,
        };
        self.next_trade_id += 1;
        self.trade_log.push(trade.clone());
        trade
    }

    /// Returns a resting order by id.
    pub fn resting_order(&self, order_id: OrderId) -> Option<&Order> {
        let &(side, price) = self.resting.get(&order_id)?;
        self.side(side).get(order_id, price)
    }

    /// Every trade ever executed, oldest first.
    pub fn trade_log(&self) -> &[Trade] {
        &self.trade_log
    }

    /// Computes the current best bid, best ask and spread.
    ///
    /// The spread is present only when both sides hold orders.
    pub fn compute_spread(&self) -> (Option<Decimal>, Option<Decimal>, Option<Decimal>) {
        let best_bid = self.bids.best_price();
        let best_ask = self.asks.best_price();
        let spread = best_bid.zip(best_ask).map(|(bid, ask)| ask - bid);

        (best_bid, best_ask, spread)
    }

    /// Aggregated levels of both sides, best first, truncated to `max_levels`.
    pub fn depth(&self, max_levels: usize) -> BookSnapshot {
        BookSnapshot {
            bids: self.bids.depth(max_levels),
            asks: self.asks.depth(max_levels),
        }
    }

    /// Aggregated levels of both sides, best first.
    pub fn snapshot(&self) -> BookSnapshot {
        self.depth(usize::MAX)
    }

    /// Returns the number of distinct price levels on the bid side.
    pub fn bid_levels_count(&self) -> usize {
        self.bids.level_count()
    }

    /// Returns the number of distinct price levels on the ask side.
    pub fn ask_levels_count(&self) -> usize {
        self.asks.level_count()
    }

    /// Returns the number of resting orders at an exact price.
    pub fn orders_at_price_level(&self, price: Decimal, side: Side) -> usize {
        self.side(side)
            .level(price.normalize())
            .map_or(0, PriceLevel::order_count)
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}
