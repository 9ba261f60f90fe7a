#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for tests, examples and benchmarks of the `soft_pool` package.

use std::sync::atomic::{self, AtomicU64};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

/// Runs a test with a timeout so that a test stuck waiting on a pool fails instead of hanging.
///
/// The timeout is 10 seconds under normal conditions and 60 seconds under Miri, where thread
/// synchronization primitives are significantly slower.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog is disabled
/// and the test function is executed directly, so that mutation testing can detect mutations
/// that cause hangs.
///
/// # Panics
///
/// Panics if the test exceeds the timeout (when not in mutation testing mode) or if the test
/// function itself panics.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let answer = with_watchdog(|| 6 * 7);
/// assert_eq!(answer, 42);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let timeout = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    let (tx, rx) = mpsc::channel();

    let test_thread = thread::spawn(move || {
        // If this fails, the watchdog has already given up on us.
        drop(tx.send(test_fn()));
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_thread.join().expect("test thread already sent its result");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test exceeded {timeout:?} timeout - is something waiting on an exhausted pool?");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_thread.join() {
            Ok(()) => panic!("test thread disconnected without sending a result"),
            Err(e) => std::panic::resume_unwind(e),
        },
    }
}

/// Hands out sequential identifiers starting from 1, counting how many it has handed out.
///
/// Useful as the body of a pool creator, to tell freshly created objects apart from reused
/// ones and to count how many times the pool had to create something. Clones share the same
/// sequence.
///
/// # Example
///
/// ```rust
/// use testing::IdSequence;
///
/// let ids = IdSequence::new();
/// let creator = {
///     let ids = ids.clone();
///     move || ids.next_id()
/// };
///
/// assert_eq!(creator(), 1);
/// assert_eq!(creator(), 2);
/// assert_eq!(ids.issued(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct IdSequence {
    issued: Arc<AtomicU64>,
}

impl IdSequence {
    /// Creates a sequence that has not issued any identifiers yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next identifier.
    ///
    /// # Panics
    ///
    /// Panics if the sequence is exhausted, which no test will ever get close to.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.issued
            .fetch_add(1, atomic::Ordering::Relaxed)
            .checked_add(1)
            .expect("id sequence exhausted")
    }

    /// How many identifiers have been issued so far.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.issued.load(atomic::Ordering::Relaxed)
    }
}
