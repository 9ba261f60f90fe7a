//! Two items, two busy holders and two threads waiting for their turn.
//!
//! The main thread takes both items out of a pool with a capacity of two and starts two
//! threads that wait for an item. Each release lets one of the waiting threads continue.
//!
//! Set `RUST_LOG=soft_pool=debug` to see what the pool is doing.

use std::thread;
use std::time::Duration;

use nm::Report;
use soft_pool::{Retention, SoftPool};
use testing::IdSequence;
use tracing_subscriber::EnvFilter;

/// Something expensive enough to be worth reusing.
#[derive(Debug)]
struct Reusable {
    id: u64,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let ids = IdSequence::new();

    let pool = SoftPool::builder(move || Reusable { id: ids.next_id() })
        .max_instances(2)
        .retention(Retention::Strong)
        .build();

    let first = pool.acquire().expect("pool has capacity for two items");
    let second = pool.acquire().expect("pool has capacity for two items");

    let waiters = (1..=2)
        .map(|n| {
            let pool = pool.clone();
            thread::spawn(move || {
                println!("\twaiter {n}: start wait");
                let item = pool.acquire_blocking();
                println!("\twaiter {n}: got {:?}", *item);
                println!("\twaiter {n}: end wait");
                pool.release(item).expect("item came from this pool");
            })
        })
        .collect::<Vec<_>>();

    println!("main: holding {:?} and {:?}", *first, *second);

    thread::sleep(Duration::from_millis(500));
    println!("main: releasing item {}", first.id);
    pool.release(first).expect("item came from this pool");

    thread::sleep(Duration::from_millis(500));
    println!("main: releasing item {}", second.id);
    pool.release(second).expect("item came from this pool");

    for waiter in waiters {
        waiter.join().expect("waiter thread panicked");
    }

    println!(
        "main: {} items in the pool, {} live",
        pool.size(),
        pool.live_instance_count()
    );

    println!();
    println!("{}", Report::collect());
}
