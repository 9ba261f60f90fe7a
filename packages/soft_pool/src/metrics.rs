//! Events observed by every pool in the process. `nm` merges the per-thread data on collection.

use nm::{Event, Magnitude};

const WAIT_DURATION_MS_BUCKETS: &[Magnitude] = &[0, 1, 5, 10, 50, 100, 500, 1000, 5000];

thread_local! {
    pub(crate) static ITEMS_ACQUIRED: Event = Event::builder()
        .name("soft_pool_items_acquired")
        .build();

    pub(crate) static ITEMS_CREATED: Event = Event::builder()
        .name("soft_pool_items_created")
        .build();

    pub(crate) static ITEMS_REUSED: Event = Event::builder()
        .name("soft_pool_items_reused")
        .build();

    pub(crate) static ITEMS_RECLAIMED: Event = Event::builder()
        .name("soft_pool_items_reclaimed")
        .build();

    pub(crate) static ITEMS_RELEASED: Event = Event::builder()
        .name("soft_pool_items_released")
        .build();

    pub(crate) static RELEASES_REJECTED: Event = Event::builder()
        .name("soft_pool_releases_rejected")
        .build();

    pub(crate) static ACQUIRE_EXHAUSTED: Event = Event::builder()
        .name("soft_pool_acquire_exhausted")
        .build();

    pub(crate) static ACQUIRE_WAIT_DURATION_MS: Event = Event::builder()
        .name("soft_pool_acquire_wait_duration_ms")
        .histogram(WAIT_DURATION_MS_BUCKETS)
        .build();
}
