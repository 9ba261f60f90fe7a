//! Example that demonstrates the usage shown in the package documentation.

use soft_pool::{Retention, SoftPool};

fn main() {
    println!("=== Soft Pool README Example ===");

    let pool = SoftPool::builder(|| vec![0_u8; 1024])
        .max_instances(2)
        .retention(Retention::Strong)
        .build();

    let first = pool.acquire().expect("pool has capacity for two buffers");
    let second = pool.acquire().expect("pool has capacity for two buffers");

    assert!(pool.acquire().is_none());
    println!("Pool is at capacity with {} live buffers", pool.live_instance_count());

    pool.release(first).expect("buffer came from this pool");

    let third = pool.acquire().expect("released buffer is available for reuse");
    println!("Reused a buffer of {} bytes", third.len());

    pool.release(second).expect("buffer came from this pool");
    pool.release(third).expect("buffer came from this pool");

    println!("README example completed successfully!");
}
