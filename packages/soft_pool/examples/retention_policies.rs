//! Shows how the retention policy affects which released objects can be reused.
//!
//! Set `RUST_LOG=soft_pool=debug` to see the pool creating and reclaiming objects.

use std::thread;
use std::time::Duration;

use soft_pool::{Retention, SoftPool};
use testing::IdSequence;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    weak();
    strong();
    ttl();
}

fn weak() {
    println!("=== Weak retention ===");

    let ids = IdSequence::new();
    let pool = SoftPool::builder(move || ids.next_id())
        .retention(Retention::Weak)
        .build();

    let item = pool.acquire().expect("unbounded pool always has capacity");
    let keepalive = item.share();
    pool.release(item).expect("item came from this pool");

    // Still referenced by `keepalive`, so it is reused.
    let item = pool.acquire().expect("unbounded pool always has capacity");
    println!("reused while referenced elsewhere: {}", *item);

    drop(keepalive);
    pool.release(item).expect("item came from this pool");

    // Nothing references it anymore, so the pool creates a new one.
    let item = pool.acquire().expect("unbounded pool always has capacity");
    println!("created after the old one was reclaimed: {}", *item);
}

fn strong() {
    println!("=== Strong retention ===");

    let ids = IdSequence::new();
    let pool = SoftPool::builder(move || ids.next_id())
        .retention(Retention::Strong)
        .build();

    let item = pool.acquire().expect("unbounded pool always has capacity");
    pool.release(item).expect("item came from this pool");

    let item = pool.acquire().expect("unbounded pool always has capacity");
    println!("reused without any outside references: {}", *item);
}

fn ttl() {
    println!("=== TTL retention ===");

    let ids = IdSequence::new();
    let pool = SoftPool::builder(move || ids.next_id())
        .retention(Retention::Ttl(Duration::from_millis(100)))
        .build();

    let item = pool.acquire().expect("unbounded pool always has capacity");
    pool.release(item).expect("item came from this pool");

    let item = pool.acquire().expect("unbounded pool always has capacity");
    println!("reused before expiry: {}", *item);
    pool.release(item).expect("item came from this pool");

    thread::sleep(Duration::from_millis(200));
    println!("purged after expiry: {}", pool.purge());

    let item = pool.acquire().expect("unbounded pool always has capacity");
    println!("created after expiry: {}", *item);
}
