//! Benchmark comparing the coarse-grained and optimistic feed variants
//! under read-heavy and write-heavy workloads.
//!
//! Run with: cargo bench --package ripple-core --bench feed_benchmark

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use rand::Rng;
use std::sync::Arc;
use std::thread;

use ripple_core::CoarseFeed;
use ripple_core::FastRwLock;
use ripple_core::Feed;
use ripple_core::OptimisticFeed;

const OPS_PER_THREAD: usize = 2_000;
const PREPOPULATE: usize = 500;

// Type aliases for convenience
type FastCoarseFeed = CoarseFeed<FastRwLock>;
type FastOptimisticFeed = OptimisticFeed<FastRwLock>;

/// Mixed workload: mostly membership tests, some adds and removes.
fn bench_mixed<F>(threads: usize)
where
    F: Feed + Default + 'static,
{
    let feed = Arc::new(F::default());

    for i in 0..PREPOPULATE {
        feed.add(format!("seed-{i}"), i as f64);
    }

    let handles: Vec<_> = (0..threads)
        .map(|tid| {
            let feed = Arc::clone(&feed);
            thread::spawn(move || {
                let mut rng = rand::rng();
                for i in 0..OPS_PER_THREAD {
                    let ts = rng.random_range(0..PREPOPULATE * 2) as f64;
                    match i % 10 {
                        0 => feed.add(format!("t{tid}-{i}"), ts),
                        1 => {
                            feed.remove(ts);
                        }
                        _ => {
                            feed.contains(ts);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

fn feed_variants(c: &mut Criterion) {
    let mut group = c.benchmark_group("feed_mixed_workload");
    group.sample_size(10);

    for threads in [1, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("coarse", threads),
            &threads,
            |b, &threads| b.iter(|| bench_mixed::<FastCoarseFeed>(threads)),
        );
        group.bench_with_input(
            BenchmarkId::new("optimistic", threads),
            &threads,
            |b, &threads| b.iter(|| bench_mixed::<FastOptimisticFeed>(threads)),
        );
    }

    group.finish();
}

criterion_group!(benches, feed_variants);
criterion_main!(benches);
