//! Basic benchmarks for the `soft_pool` crate.
#![allow(
    missing_docs,
    reason = "No need for API documentation in benchmark code"
)]

use std::hint::black_box;
use std::iter;
use std::time::Instant;

use alloc_tracker::Allocator;
use criterion::{Criterion, criterion_group, criterion_main};
use soft_pool::{Retention, SoftPool};

criterion_group!(benches, entrypoint);
criterion_main!(benches);

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

type TestItem = [u64; 16];
const TEST_VALUE: TestItem = [1024; 16];

fn entrypoint(c: &mut Criterion) {
    let allocs = alloc_tracker::Session::new();

    let mut group = c.benchmark_group("sp_basic");

    let allocs_op = allocs.operation("acquire_create");
    group.bench_function("acquire_create", |b| {
        b.iter_custom(|iters| {
            let pools = iter::repeat_with(|| SoftPool::new(|| TEST_VALUE))
                .take(usize::try_from(iters).unwrap())
                .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for pool in &pools {
                drop(black_box(pool.acquire()));
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("acquire_release_strong");
    group.bench_function("acquire_release_strong", |b| {
        b.iter_custom(|iters| {
            let pool = SoftPool::builder(|| TEST_VALUE)
                .retention(Retention::Strong)
                .build();

            // Warm up so the measured loop only ever reuses.
            let item = pool.acquire().unwrap();
            pool.release(item).unwrap();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let item = black_box(pool.acquire().unwrap());
                pool.release(item).unwrap();
            }

            start.elapsed()
        });
    });

    let allocs_op = allocs.operation("acquire_release_weak_kept_alive");
    group.bench_function("acquire_release_weak_kept_alive", |b| {
        b.iter_custom(|iters| {
            let pool = SoftPool::builder(|| TEST_VALUE)
                .retention(Retention::Weak)
                .build();

            let item = pool.acquire().unwrap();
            let keepalive = item.share();
            pool.release(item).unwrap();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for _ in 0..iters {
                let item = black_box(pool.acquire().unwrap());
                pool.release(item).unwrap();
            }

            let elapsed = start.elapsed();

            drop(keepalive);

            elapsed
        });
    });

    let allocs_op = allocs.operation("purge_100_reclaimed");
    group.bench_function("purge_100_reclaimed", |b| {
        b.iter_custom(|iters| {
            let pools = iter::repeat_with(|| {
                let pool = SoftPool::builder(|| TEST_VALUE)
                    .retention(Retention::Weak)
                    .build();

                let items = iter::repeat_with(|| pool.acquire().unwrap())
                    .take(100)
                    .collect::<Vec<_>>();

                for item in items {
                    pool.release(item).unwrap();
                }

                pool
            })
            .take(usize::try_from(iters).unwrap())
            .collect::<Vec<_>>();

            let _span = allocs_op.measure_thread().iterations(iters);

            let start = Instant::now();

            for pool in &pools {
                _ = black_box(pool.purge());
            }

            start.elapsed()
        });
    });

    group.finish();

    allocs.print_to_stdout();
}
