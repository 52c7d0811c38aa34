use crate::types::{LevelSummary, Order, OrderId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// All resting orders at one price, in time priority.
///
/// Orders are held by value in a FIFO queue; the head is always the next maker.
/// The level keeps a running `aggregate_quantity` equal to the sum of the
/// remaining quantities of its orders.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Decimal,
    orders: VecDeque<Order>,
    aggregate_quantity: u64,
}

impl PriceLevel {
    /// Creates an empty level at `price`.
    pub fn new(price: Decimal) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
            aggregate_quantity: 0,
        }
    }

    /// The price shared by every order in the level.
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Sum of the remaining quantities of the queued orders.
    pub fn aggregate_quantity(&self) -> u64 {
        self.aggregate_quantity
    }

    /// Returns the number of queued orders.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Returns `true` once the last order has left the queue.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// The order that will be matched next.
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Orders from oldest to newest.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Appends an order at the tail of the queue.
    ///
    /// The caller keeps `aggregate_quantity` within `u64`; the matching engine
    /// rejects orders that would overflow it before touching the book.
    pub fn push_back(&mut self, order: Order) {
        debug_assert!(self
            .orders
            .back()
            .map_or(true, |last| last.arrival_sequence < order.arrival_sequence));
        self.aggregate_quantity += order.remaining_quantity;
        self.orders.push_back(order);
    }

    /// Reduces the head order by `quantity`.
    ///
    /// Returns the head order if it was exhausted and removed from the queue.
    /// `quantity` is capped at the head's remaining quantity.
    pub fn fill_front(&mut self, quantity: u64) -> Option<Order> {
        let head = self.orders.front_mut()?;
        let filled = quantity.min(head.remaining_quantity);
        head.remaining_quantity -= filled;
        self.aggregate_quantity -= filled;

        if head.remaining_quantity == 0 {
            self.orders.pop_front()
        } else {
            None
        }
    }

    /// Removes an order anywhere in the queue.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let position = self
            .orders
            .iter()
            .position(|order| order.order_id == order_id)?;
        let order = self.orders.remove(position)?;
        self.aggregate_quantity -= order.remaining_quantity;
        Some(order)
    }

    /// Lowers an order's remaining quantity without moving it in the queue.
    ///
    /// Returns `false` if the order is absent or `new_quantity` is not a
    /// reduction to a positive value.
    pub fn reduce(&mut self, order_id: OrderId, new_quantity: u64) -> bool {
        let Some(order) = self
            .orders
            .iter_mut()
            .find(|order| order.order_id == order_id)
        else {
            return false;
        };
        if new_quantity == 0 || new_quantity > order.remaining_quantity {
            return false;
        }

        self.aggregate_quantity -= order.remaining_quantity - new_quantity;
        order.remaining_quantity = new_quantity;
        true
    }

    /// Removes and returns every order expired at `now`, preserving the order of the rest.
    pub fn remove_expired(&mut self, now: DateTime<Utc>) -> Vec<Order> {
        let mut expired = Vec::new();
        let mut kept = VecDeque::with_capacity(self.orders.len());

        for order in self.orders.drain(..) {
            if order.is_expired(now) {
                self.aggregate_quantity -= order.remaining_quantity;
                expired.push(order);
            } else {
                kept.push_back(order);
            }
        }

        self.orders = kept;
        expired
    }

    /// Aggregated view of the level for depth queries.
    ///
    /// ## Examples
    ///
    /// ```
    /// use order_book_engine::{Decimal, PriceLevel};
    ///
    /// let level = PriceLevel::new(Decimal::new(1005, 1));
    /// let summary = level.summary();
    /// assert_eq!(summary.quantity, 0);
    /// assert_eq!(summary.order_count, 0);
    /// ```
    pub fn summary(&self) -> LevelSummary {
        LevelSummary {
            price: self.price,
            quantity: self.aggregate_quantity,
            order_count: self.orders.len(),
        }
    }
}
