use order_book_engine::{
    AddOrder, Decimal, EngineConfig, MatchingEngine, OrderState, OrderType, Side,
};
use proptest::prelude::*;
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Command {
    side: Side,
    order_type: OrderType,
    price_ticks: i64,
    quantity: i64,
}

fn command_strategy() -> impl Strategy<Value = Command> {
    (
        prop_oneof![Just(Side::Buy), Just(Side::Sell)],
        prop_oneof![4 => Just(OrderType::Limit), 1 => Just(OrderType::Market)],
        90i64..110,
        1i64..20,
    )
        .prop_map(|(side, order_type, price_ticks, quantity)| Command {
            side,
            order_type,
            price_ticks,
            quantity,
        })
}

fn to_add_order(order_id: u64, command: &Command) -> AddOrder {
    match command.order_type {
        OrderType::Limit => AddOrder::limit(
            order_id,
            Decimal::new(command.price_ticks, 1),
            command.quantity,
            command.side,
        ),
        OrderType::Market => AddOrder::market(order_id, command.quantity, command.side),
    }
}

proptest! {
    #[test]
    /// After every admission the best bid is strictly below the best ask.
    fn prop_book_never_crosses(commands in prop::collection::vec(command_strategy(), 1..200)) {
        let mut engine = MatchingEngine::new(EngineConfig::default());

        for (order_id, command) in commands.iter().enumerate() {
            engine.admit(to_add_order(order_id as u64, command)).unwrap();

            if let (Ok(bid), Ok(ask)) = (engine.best(Side::Buy), engine.best(Side::Sell)) {
                prop_assert!(bid.price < ask.price, "crossed book: {} >= {}", bid.price, ask.price);
            }
            let (best_bid, best_ask, _) = engine.book().compute_spread();
            prop_assert_eq!(engine.best(Side::Buy).ok().map(|best| best.price), best_bid);
            prop_assert_eq!(engine.best(Side::Sell).ok().map(|best| best.price), best_ask);
        }
    }

    #[test]
    /// Every trade is positive and moves exactly its quantity off both orders.
    fn prop_quantity_is_conserved(commands in prop::collection::vec(command_strategy(), 1..200)) {
        let mut engine = MatchingEngine::new(EngineConfig::default());
        let mut filled: HashMap<u64, u64> = HashMap::new();
        let mut submitted: HashMap<u64, u64> = HashMap::new();

        for (order_id, command) in commands.iter().enumerate() {
            let order_id = order_id as u64;
            submitted.insert(order_id, command.quantity as u64);
            let admission = engine.admit(to_add_order(order_id, command)).unwrap();

            let mut taker_filled = 0;
            for trade in &admission.trades {
                prop_assert!(trade.quantity > 0);
                *filled.entry(trade.buy_order_id).or_default() += trade.quantity;
                *filled.entry(trade.sell_order_id).or_default() += trade.quantity;
                taker_filled += trade.quantity;
            }

            let expected_leftover = command.quantity as u64 - taker_filled;
            match admission.state {
                OrderState::Filled => prop_assert_eq!(expected_leftover, 0),
                OrderState::Resting { remaining } => prop_assert_eq!(remaining, expected_leftover),
                OrderState::Discarded { unfilled } => {
                    prop_assert_eq!(command.order_type, OrderType::Market);
                    prop_assert_eq!(unfilled, expected_leftover);
                }
            }
        }

        for (order_id, quantity) in &submitted {
            let traded = filled.get(order_id).copied().unwrap_or(0);
            prop_assert!(traded <= *quantity);
            if let Some(order) = engine.book().resting_order(*order_id) {
                prop_assert_eq!(order.remaining_quantity + traded, *quantity);
            }
        }
    }

    #[test]
    /// Levels of one price are drained oldest order first.
    fn prop_fifo_within_level(quantities in prop::collection::vec(1i64..10, 2..20)) {
        let mut engine = MatchingEngine::new(EngineConfig::default());
        let level_price = Decimal::new(100, 0);
        for (order_id, quantity) in quantities.iter().enumerate() {
            engine
                .admit(AddOrder::limit(order_id as u64, level_price, *quantity, Side::Sell))
                .unwrap();
        }

        let total: i64 = quantities.iter().sum();
        let admission = engine
            .admit(AddOrder::limit(1_000, level_price, total, Side::Buy))
            .unwrap();

        let makers: Vec<u64> = admission.trades.iter().map(|trade| trade.sell_order_id).collect();
        let expected: Vec<u64> = (0..quantities.len() as u64).collect();
        prop_assert_eq!(makers, expected);
        prop_assert_eq!(admission.state, OrderState::Filled);
    }

    #[test]
    /// Market orders never leave anything resting on their own side.
    fn prop_market_orders_never_rest(commands in prop::collection::vec(command_strategy(), 1..100)) {
        let mut engine = MatchingEngine::new(EngineConfig::default());

        for (order_id, command) in commands.iter().enumerate() {
            let order_id = order_id as u64;
            engine.admit(to_add_order(order_id, command)).unwrap();
            if command.order_type == OrderType::Market {
                prop_assert!(engine.book().resting_order(order_id).is_none());
            }
        }
    }
}
