use crate::error::EmptyBookSide;
use crate::price_level::PriceLevel;
use crate::types::{LevelSummary, Order, OrderId, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// One side of the book: price levels keyed by price.
///
/// Levels live in a `BTreeMap`, so the best level is the last key on the bid
/// side (highest price) and the first key on the ask side (lowest price), both
/// reachable in $O(\log{N})$. A level exists only while it holds orders.
#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Decimal, PriceLevel>,
}

impl BookSide {
    /// Creates an empty side.
    ///
    /// ## Examples
    ///
    /// ```
    /// use order_book_engine::{BookSide, Side};
    ///
    /// let bids = BookSide::new(Side::Buy);
    /// assert!(bids.is_empty());
    /// assert!(bids.peek_best().is_err());
    /// ```
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Which side of the book this is.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Appends an order to the tail of the level at its price, creating the level if needed.
    pub fn insert(&mut self, order: Order) {
        debug_assert_eq!(order.side, self.side);
        self.levels
            .entry(order.price)
            .or_insert_with(|| PriceLevel::new(order.price))
            .push_back(order);
    }

    /// Returns the level at the best price for this side.
    pub fn peek_best(&self) -> Result<&PriceLevel, EmptyBookSide> {
        let best = match self.side {
            Side::Buy => self.levels.values().next_back(),
            Side::Sell => self.levels.values().next(),
        };
        best.ok_or(EmptyBookSide { side: self.side })
    }

    /// Price of the best level, or `None` when the side is empty.
    pub fn best_price(&self) -> Option<Decimal> {
        self.peek_best().ok().map(PriceLevel::price)
    }

    /// Fills `quantity` against the head order of the level at `price`.
    ///
    /// The head order leaves the queue once exhausted and the level leaves the
    /// side once empty. Returns the exhausted order, if any.
    pub fn consume(&mut self, price: Decimal, quantity: u64) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let exhausted = level.fill_front(quantity);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        exhausted
    }

    /// Removes a specific order from the level at `price`.
    pub fn remove(&mut self, order_id: OrderId, price: Decimal) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let removed = level.remove(order_id);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        removed
    }

    /// Lowers a resting order's quantity in place, keeping its time priority.
    pub fn reduce(&mut self, order_id: OrderId, price: Decimal, new_quantity: u64) -> bool {
        self.levels
            .get_mut(&price)
            .is_some_and(|level| level.reduce(order_id, new_quantity))
    }

    /// Returns the level at exactly `price`, if any order rests there.
    pub fn level(&self, price: Decimal) -> Option<&PriceLevel> {
        self.levels.get(&price)
    }

    /// Looks up a resting order at a known price.
    pub fn get(&self, order_id: OrderId, price: Decimal) -> Option<&Order> {
        self.level(price)?
            .orders()
            .find(|order| order.order_id == order_id)
    }

    /// Removes every order expired at `now`, dropping levels left empty.
    pub fn remove_expired(&mut self, now: DateTime<Utc>) -> Vec<Order> {
        let mut expired = Vec::new();
        for level in self.levels.values_mut() {
            expired.extend(level.remove_expired(now));
        }
        self.levels.retain(|_, level| !level.is_empty());
        expired
    }

    /// Levels in priority order, best first.
    pub fn levels(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev()),
            Side::Sell => Box::new(self.levels.values()),
        }
    }

    /// Summaries of at most `max_levels` levels, best first.
    pub fn depth(&self, max_levels: usize) -> Vec<LevelSummary> {
        self.levels()
            .take(max_levels)
            .map(PriceLevel::summary)
            .collect()
    }

    /// Returns `true` if no order rests on this side.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns the number of distinct price levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Returns the number of resting orders across all levels.
    pub fn order_count(&self) -> usize {
        self.levels.values().map(PriceLevel::order_count).sum()
    }

    /// Sum of every level's aggregate quantity, saturating at `u64::MAX`.
    ///
    /// Each level fits in a `u64` but the whole side may not.
    pub fn total_quantity(&self) -> u64 {
        self.levels
            .values()
            .map(PriceLevel::aggregate_quantity)
            .fold(0, u64::saturating_add)
    }
}
