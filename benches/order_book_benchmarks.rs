use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use order_book_engine::{AddOrder, Decimal, EngineConfig, MatchingEngine, OrderBookFacade, Side};
use std::sync::Arc;

/// Builds an engine with `levels` non-crossing levels per side, one order each.
fn populated_engine(levels: u64) -> (MatchingEngine, u64) {
    let mut engine = MatchingEngine::new(EngineConfig::default());
    let mut order_id = 0;
    for i in 0..levels {
        let offset = Decimal::new(i as i64, 2);
        engine
            .admit(AddOrder::limit(order_id, Decimal::from(100) - offset, 100, Side::Buy))
            .unwrap();
        engine
            .admit(AddOrder::limit(order_id + 1, Decimal::from(101) + offset, 100, Side::Sell))
            .unwrap();
        order_id += 2;
    }
    (engine, order_id)
}

/// Benchmark the performance of resting a single non-crossing order.
fn benchmark_resting_order_admission(criterion: &mut Criterion) {
    let mut benchmark_group = criterion.benchmark_group("resting_admission");

    benchmark_group.bench_function("admit_non_crossing_bid", |bencher| {
        let mut engine = MatchingEngine::new(EngineConfig::default());
        let mut order_id = 0u64;

        bencher.iter(|| {
            // Cycle through 1000 distinct prices below any ask
            let price = Decimal::new(10_000 - (order_id % 1_000) as i64, 2);
            let admission = engine
                .admit(AddOrder::limit(order_id, price, 100, Side::Buy))
                .unwrap();
            black_box(admission);
            order_id += 1;
        });
    });

    benchmark_group.finish();
}

/// Benchmark a market order sweeping a number of levels on a large book.
fn benchmark_sweeping_market_order(criterion: &mut Criterion) {
    let mut benchmark_group = criterion.benchmark_group("market_sweep");

    for swept_levels in [1u64, 10, 100] {
        benchmark_group.throughput(Throughput::Elements(swept_levels));

        benchmark_group.bench_with_input(
            BenchmarkId::new("sweep_levels", swept_levels),
            &swept_levels,
            |bencher, &swept_levels| {
                bencher.iter_batched(
                    || populated_engine(1_000),
                    |(mut engine, next_id)| {
                        let admission = engine
                            .admit(AddOrder::market(next_id, (swept_levels * 100) as i64, Side::Buy))
                            .unwrap();
                        black_box(admission);
                    },
                    criterion::BatchSize::LargeInput,
                );
            },
        );
    }

    benchmark_group.finish();
}

/// Benchmark the top-of-book read at various book sizes.
fn benchmark_best_price_reads(criterion: &mut Criterion) {
    let mut benchmark_group = criterion.benchmark_group("best_price");

    for book_size in [100, 1_000, 10_000] {
        benchmark_group.throughput(Throughput::Elements(1));
        let (engine, _) = populated_engine(book_size);

        benchmark_group.bench_with_input(
            BenchmarkId::new("best_bid_and_ask", book_size),
            &engine,
            |bencher, engine| {
                bencher.iter(|| {
                    let quotes = (engine.best(Side::Buy), engine.best(Side::Sell));
                    black_box(quotes);
                });
            },
        );
    }

    benchmark_group.finish();
}

/// Benchmark a mixed workload of commands and queries through the facade.
fn benchmark_concurrent_facade(criterion: &mut Criterion) {
    let mut benchmark_group = criterion.benchmark_group("concurrent_facade");

    for threads_count in [1u64, 2, 4, 8] {
        benchmark_group.bench_with_input(
            BenchmarkId::new("submit_and_read", threads_count),
            &threads_count,
            |bencher, &thread_count| {
                bencher.iter(|| {
                    let facade = Arc::new(OrderBookFacade::new(EngineConfig::default()));
                    let mut thread_handles = vec![];

                    for thread_id in 0..thread_count {
                        let facade_clone = Arc::clone(&facade);
                        thread_handles.push(std::thread::spawn(move || {
                            for i in 0..100u64 {
                                let order_id = thread_id * 100 + i;
                                let side = if i % 2 == 0 { Side::Buy } else { Side::Sell };
                                let price = Decimal::from(95 + (order_id % 11));
                                let receipt = facade_clone
                                    .submit_order(AddOrder::limit(order_id, price, 10, side))
                                    .unwrap();
                                black_box((receipt, facade_clone.best_bid(), facade_clone.best_ask()));
                            }
                        }));
                    }

                    for handle in thread_handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    benchmark_group.finish();
}

// Define the benchmarks group to generate the reports automatically
criterion_group!(
    benches,
    benchmark_resting_order_admission,
    benchmark_sweeping_market_order,
    benchmark_best_price_reads,
    benchmark_concurrent_facade,
);

criterion_main!(benches);
