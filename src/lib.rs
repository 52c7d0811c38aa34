//! A price-time priority matching engine for a single instrument, with an
//! $O(1)$ top-of-book cache and a thread-safe command surface.
//!
//! ## Architecture
//!
//! The crate is layered, leaves first:
//!
//! 1. `PriceLevel`: FIFO queue of resting orders at one price
//! 2. `BookSide`: price levels of one side, ordered by price priority
//! 3. `OrderBook`: both sides, the arrival counter, the id index and the trade log
//! 4. `MatchingEngine`: admits orders, runs the matching loop and keeps the
//!    `TopOfBookCache` in step with every mutation
//! 5. `OrderBookFacade`: owns the engine behind a lock and publishes `BookEvent`s
//!    to an `EventSink`
//!
//! ## Example Usage
//!
//! ```rust
//! use order_book_engine::{AddOrder, Decimal, EngineConfig, OrderBookFacade, Side};
//! use std::sync::Arc;
//!
//! let facade = Arc::new(OrderBookFacade::new(EngineConfig::default()));
//!
//! // A resting bid...
//! facade
//!     .submit_order(AddOrder::limit(1, Decimal::new(1005, 1), 10, Side::Buy))
//!     .unwrap();
//!
//! // ...is hit by a crossing ask, which trades at the bid's price
//! let receipt = facade
//!     .submit_order(AddOrder::limit(3, Decimal::new(995, 1), 5, Side::Sell))
//!     .unwrap();
//! assert_eq!(receipt.trades[0].price, Decimal::new(1005, 1));
//! assert_eq!(receipt.trades[0].quantity, 5);
//!
//! let best_bid = facade.best_bid().unwrap();
//! assert_eq!((best_bid.price, best_bid.quantity), (Decimal::new(1005, 1), 5));
//! assert!(facade.best_ask().is_err());
//! ```
//!
//! Commands hold the facade's write lock for their whole run, so no reader
//! ever observes a partially applied match. Queries only take the read lock,
//! which lets many readers proceed together between commands.
//!
//! Self-trade prevention is not performed: two orders from the same party
//! trade with each other like any other pair.

mod book_side;
mod config;
mod error;
mod events;
mod facade;
mod matching_engine;
mod order_book;
mod price_level;
mod top_of_book;
mod types;

// Re-export public API
pub use book_side::BookSide;
pub use config::EngineConfig;
pub use error::{ConfigError, EmptyBookSide, OrderError, PublishError};
pub use events::{BestPriceChanged, BookEvent, ChannelEventSink, EventSink, NoopEventSink};
pub use facade::{OrderBookFacade, OrderReceipt};
pub use matching_engine::{Admission, Cancellation, Expiry, MatchingEngine};
pub use order_book::OrderBook;
pub use price_level::PriceLevel;
pub use top_of_book::TopOfBookCache;
pub use types::{
    AddOrder, AmendOrder, BestPrice, BookSnapshot, LevelSummary, Order, OrderAck, OrderId,
    OrderState, OrderType, Side, Trade,
};

// Re-export commonly used external dependencies
pub use rust_decimal::Decimal;
