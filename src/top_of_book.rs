use crate::book_side::BookSide;
use crate::error::EmptyBookSide;
use crate::events::{BestPriceChanged, BookEvent};
use crate::types::{BestPrice, Side};
use chrono::{DateTime, Utc};

/// Cached best level of each side.
///
/// Reads are $O(1)$. The cache does not observe the book on its own: the
/// matching engine calls `refresh` after every mutation, while still holding
/// exclusive access to the book, so the cache never lags a completed command.
#[derive(Debug, Clone, Default)]
pub struct TopOfBookCache {
    best_bid: Option<BestPrice>,
    best_ask: Option<BestPrice>,
}

impl TopOfBookCache {
    /// Creates a cache reporting both sides as empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached quote for `side`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use order_book_engine::{Side, TopOfBookCache};
    ///
    /// let cache = TopOfBookCache::new();
    /// assert!(cache.best(Side::Buy).is_err());
    /// ```
    pub fn best(&self, side: Side) -> Result<BestPrice, EmptyBookSide> {
        let cached = match side {
            Side::Buy => self.best_bid,
            Side::Sell => self.best_ask,
        };
        cached.ok_or(EmptyBookSide { side })
    }

    /// Recomputes the entry for `book_side` from its current best level.
    ///
    /// The timestamp only moves when the price or aggregate quantity at the top
    /// changes. Returns the event describing the change, or `None` if the top
    /// is unchanged.
    pub fn refresh(&mut self, book_side: &BookSide, now: DateTime<Utc>) -> Option<BookEvent> {
        let side = book_side.side();
        let current = book_side
            .peek_best()
            .ok()
            .map(|level| (level.price(), level.aggregate_quantity()));

        let slot = match side {
            Side::Buy => &mut self.best_bid,
            Side::Sell => &mut self.best_ask,
        };

        match (current, *slot) {
            (None, None) => None,
            (None, Some(_)) => {
                *slot = None;
                Some(BookEvent::BookSideEmptied {
                    side,
                    timestamp: now,
                })
            }
            (Some((price, quantity)), Some(cached))
                if cached.price == price && cached.quantity == quantity =>
            {
                None
            }
            (Some((price, quantity)), _) => {
                let best = BestPrice {
                    price,
                    quantity,
                    timestamp: now,
                };
                *slot = Some(best);
                Some(BookEvent::BestPriceChanged(BestPriceChanged::new(side, best)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Order, OrderType};
    use rust_decimal::Decimal;

    fn ask(order_id: u64, price: i64, quantity: u64) -> Order {
        Order {
            order_id,
            price: Decimal::new(price, 0),
            remaining_quantity: quantity,
            side: Side::Sell,
            order_type: OrderType::Limit,
            arrival_sequence: order_id,
            timestamp: Utc::now(),
            expires_at: None,
        }
    }

    #[test]
    fn test_refresh_reports_new_best_once() {
        let mut cache = TopOfBookCache::new();
        let mut asks = BookSide::new(Side::Sell);
        asks.insert(ask(1, 1400, 10));

        let event = cache.refresh(&asks, Utc::now());
        assert!(matches!(
            event,
            Some(BookEvent::BestPriceChanged(BestPriceChanged { side: Side::Sell, quantity: 10, .. }))
        ));
        assert_eq!(cache.best(Side::Sell).unwrap().price, Decimal::new(1400, 0));
        assert!(cache.refresh(&asks, Utc::now()).is_none());

        // A worse level does not move the top
        asks.insert(ask(2, 1500, 1));
        assert!(cache.refresh(&asks, Utc::now()).is_none());
    }

    #[test]
    fn test_refresh_tracks_quantity_and_emptying() {
        let mut cache = TopOfBookCache::new();
        let mut asks = BookSide::new(Side::Sell);
        asks.insert(ask(1, 50, 2));
        cache.refresh(&asks, Utc::now());

        asks.consume(Decimal::new(50, 0), 1);
        assert!(cache.refresh(&asks, Utc::now()).is_some());
        assert_eq!(cache.best(Side::Sell).unwrap().quantity, 1);

        asks.consume(Decimal::new(50, 0), 1);
        assert!(matches!(
            cache.refresh(&asks, Utc::now()),
            Some(BookEvent::BookSideEmptied { side: Side::Sell, .. })
        ));
        assert_eq!(
            cache.best(Side::Sell),
            Err(EmptyBookSide { side: Side::Sell })
        );
        assert!(cache.best(Side::Buy).is_err());
    }
}
