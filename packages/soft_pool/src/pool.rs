use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

use nm::Event;
use scopeguard::ScopeGuard;

use crate::constants::{ERR_LIVE_COUNT_OVERFLOW, ERR_LIVE_COUNT_UNDERFLOW, ERR_POISONED_LOCK};
use crate::metrics::{
    ACQUIRE_EXHAUSTED, ACQUIRE_WAIT_DURATION_MS, ITEMS_ACQUIRED, ITEMS_CREATED, ITEMS_RECLAIMED,
    ITEMS_RELEASED, ITEMS_REUSED, RELEASES_REJECTED,
};
use crate::retention::FreeEntry;
use crate::{Creator, Error, PoolId, Pooled, ReleaseError, Retention, SoftPoolBuilder};

/// A bounded object pool that reuses released objects without insisting on keeping them alive.
///
/// Objects are obtained via one of the acquire methods, which differ in what they do when the
/// pool has nothing to offer:
///
/// * [`acquire()`][1] - returns `None` immediately.
/// * [`acquire_blocking()`][2] - waits until another caller releases an object.
/// * [`acquire_timeout()`][3] - waits for a limited time, then returns `None`.
///
/// Each acquire first looks for a reusable object in the free registry, starting with the most
/// recently released one. If there is none, the pool asks its [`Creator`] for a new object as
/// long as it is below its capacity ceiling ([`max_instances()`][4]).
///
/// Objects are returned to the pool via [`release()`][5]. What happens to them afterwards is
/// governed by the pool's [`Retention`] policy.
///
/// # Capacity accounting
///
/// The pool counts an object as live from the moment it is created until the pool discovers
/// that the object has been reclaimed, which happens either when an acquire scans past a
/// reclaimed registry entry or when [`purge()`][6] is called. The live count is therefore a
/// best-effort upper bound on the number of objects that actually exist.
///
/// # Thread safety
///
/// This type is a cloneable handle to a shared pool instance. All clones operate on the same
/// pool and can be used from any number of threads at the same time.
///
/// # Example
///
/// ```rust
/// use std::thread;
///
/// use soft_pool::{Retention, SoftPool};
///
/// let pool = SoftPool::builder(|| vec![0_u8; 16])
///     .max_instances(1)
///     .retention(Retention::Strong)
///     .build();
///
/// let buffer = pool.acquire().unwrap();
///
/// let waiter = thread::spawn({
///     let pool = pool.clone();
///     move || {
///         // Waits until the main thread releases the only buffer.
///         let buffer = pool.acquire_blocking();
///         buffer.len()
///     }
/// });
///
/// pool.release(buffer).unwrap();
/// assert_eq!(waiter.join().unwrap(), 16);
/// ```
///
/// [1]: Self::acquire
/// [2]: Self::acquire_blocking
/// [3]: Self::acquire_timeout
/// [4]: Self::max_instances
/// [5]: Self::release
/// [6]: Self::purge
pub struct SoftPool<T> {
    shared: Arc<Shared<T>>,
}

struct Shared<T> {
    id: PoolId,
    retention: Retention,
    creator: Box<dyn Creator<T> + Send + Sync>,

    state: Mutex<State<T>>,

    /// Signaled whenever an acquire that found the pool exhausted may now succeed.
    /// Waking up is only a hint - the waiter must re-run the entire acquire algorithm.
    availability_changed: Condvar,
}

struct State<T> {
    /// Released objects, most recently released last.
    free: Vec<FreeEntry<T>>,

    /// Objects created and not yet found to be reclaimed, including reservations for objects
    /// that a creator is manufacturing right now.
    live_count: usize,

    max_instances: usize,
}

/// What an acquire attempt obtained while holding the lock.
enum Checkout<T> {
    Reused(Arc<T>),

    /// A unit of capacity has been reserved; the caller must now create the object
    /// (outside the lock) or cancel the reservation.
    Reserved,
}

impl<T> SoftPool<T> {
    /// Creates a new pool that manufactures objects with `creator`.
    ///
    /// The pool is unbounded and keeps released objects for reuse until they have been idle
    /// for [`DEFAULT_IDLE_TTL`][2]. Use [`builder()`][1] to customize the configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use soft_pool::SoftPool;
    ///
    /// let pool = SoftPool::new(|| 123_u32);
    ///
    /// let item = pool.acquire().unwrap();
    /// assert_eq!(*item, 123);
    /// assert_eq!(pool.live_instance_count(), 1);
    /// ```
    ///
    /// [1]: Self::builder
    /// [2]: crate::DEFAULT_IDLE_TTL
    #[must_use]
    pub fn new<C>(creator: C) -> Self
    where
        C: Creator<T> + Send + Sync + 'static,
    {
        Self::builder(creator).build()
    }

    /// Starts building a new pool that manufactures objects with `creator`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use soft_pool::SoftPool;
    ///
    /// let pool = SoftPool::builder(|| 0_i64).max_instances(4).build();
    ///
    /// assert_eq!(pool.max_instances(), 4);
    /// ```
    pub fn builder<C>(creator: C) -> SoftPoolBuilder<T, C>
    where
        C: Creator<T> + Send + Sync + 'static,
    {
        SoftPoolBuilder::new(creator)
    }

    pub(crate) fn new_inner(
        creator: Box<dyn Creator<T> + Send + Sync>,
        max_instances: usize,
        retention: Retention,
    ) -> Self {
        let id = PoolId::next();

        tracing::debug!(pool = %id, max_instances, ?retention, "soft pool created");

        Self {
            shared: Arc::new(Shared {
                id,
                retention,
                creator,
                state: Mutex::new(State {
                    free: Vec::new(),
                    live_count: 0,
                    max_instances,
                }),
                availability_changed: Condvar::new(),
            }),
        }
    }

    /// The process-unique identifier of this pool, shared by all clones of the handle.
    #[must_use]
    #[inline]
    pub fn id(&self) -> PoolId {
        self.shared.id
    }

    /// The retention policy the pool applies to released objects.
    #[must_use]
    #[inline]
    pub fn retention(&self) -> Retention {
        self.shared.retention
    }

    /// Takes an object from the pool without waiting.
    ///
    /// Returns the most recently released object that has not been reclaimed. If there is
    /// none, creates a new object unless the pool is at capacity, in which case `None` is
    /// returned.
    ///
    /// # Panics
    ///
    /// If the creator panics, the panic is propagated to the caller.
    ///
    /// # Example
    ///
    /// ```rust
    /// use soft_pool::SoftPool;
    ///
    /// let pool = SoftPool::builder(|| 'x').max_instances(2).build();
    ///
    /// let first = pool.acquire().unwrap();
    /// let second = pool.acquire().unwrap();
    /// assert!(pool.acquire().is_none());
    /// # pool.release(first).unwrap();
    /// # pool.release(second).unwrap();
    /// ```
    #[must_use]
    pub fn acquire(&self) -> Option<Pooled<T>> {
        let checkout = self.lock().checkout(Instant::now());

        if let Some(checkout) = checkout {
            Some(self.fulfill(checkout))
        } else {
            ACQUIRE_EXHAUSTED.with(Event::observe_once);
            tracing::trace!(pool = %self.shared.id, "pool exhausted");
            None
        }
    }

    /// Takes an object from the pool, waiting for a release if the pool is at capacity.
    ///
    /// Every time a release wakes up the caller, the entire acquire algorithm runs again: the
    /// released object may already have been taken by another caller or reclaimed.
    ///
    /// # Panics
    ///
    /// If the creator panics, the panic is propagated to the caller.
    ///
    /// # Example
    ///
    /// ```rust
    /// use soft_pool::SoftPool;
    ///
    /// let pool = SoftPool::new(|| 1_u8);
    ///
    /// // Not at capacity, so this returns right away.
    /// let item = pool.acquire_blocking();
    /// assert_eq!(*item, 1);
    /// ```
    pub fn acquire_blocking(&self) -> Pooled<T> {
        let started = Instant::now();
        let mut state = self.lock();

        let checkout = loop {
            if let Some(checkout) = state.checkout(Instant::now()) {
                break checkout;
            }

            tracing::trace!(pool = %self.shared.id, "pool exhausted, waiting for release");

            state = self
                .shared
                .availability_changed
                .wait(state)
                .expect(ERR_POISONED_LOCK);
        };

        drop(state);

        ACQUIRE_WAIT_DURATION_MS.with(|x| x.observe_millis(started.elapsed()));

        self.fulfill(checkout)
    }

    /// Takes an object from the pool, waiting at most `timeout` for a release if the pool is at
    /// capacity.
    ///
    /// Returns `None` if no object became available before the timeout expired.
    ///
    /// # Panics
    ///
    /// If the creator panics, the panic is propagated to the caller.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    ///
    /// use soft_pool::SoftPool;
    ///
    /// let pool = SoftPool::builder(|| 1_u8).max_instances(1).build();
    ///
    /// let only = pool.acquire().unwrap();
    /// assert!(pool.acquire_timeout(Duration::from_millis(10)).is_none());
    /// # pool.release(only).unwrap();
    /// ```
    #[must_use]
    pub fn acquire_timeout(&self, timeout: Duration) -> Option<Pooled<T>> {
        let started = Instant::now();

        let Some(deadline) = started.checked_add(timeout) else {
            // Nobody can tell the difference between this and waiting forever.
            return Some(self.acquire_blocking());
        };

        let mut state = self.lock();

        let checkout = loop {
            let now = Instant::now();

            if let Some(checkout) = state.checkout(now) {
                break checkout;
            }

            let Some(remaining) = deadline
                .checked_duration_since(now)
                .filter(|remaining| !remaining.is_zero())
            else {
                drop(state);

                ACQUIRE_EXHAUSTED.with(Event::observe_once);
                tracing::trace!(pool = %self.shared.id, ?timeout, "timed out waiting for release");
                return None;
            };

            (state, _) = self
                .shared
                .availability_changed
                .wait_timeout(state, remaining)
                .expect(ERR_POISONED_LOCK);
        };

        drop(state);

        ACQUIRE_WAIT_DURATION_MS.with(|x| x.observe_millis(started.elapsed()));

        Some(self.fulfill(checkout))
    }

    /// Returns an object to the pool so it can be reused.
    ///
    /// The object goes into the free registry, where it is retained according to the pool's
    /// [`Retention`] policy, and one caller waiting in [`acquire_blocking()`][1] or
    /// [`acquire_timeout()`][2] is woken up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the object was handed out by a different pool. The
    /// rejected object is returned inside the error and the state of this pool is unchanged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use soft_pool::SoftPool;
    ///
    /// let pool = SoftPool::new(|| 1_u8);
    ///
    /// let item = pool.acquire().unwrap();
    ///
    /// pool.release(item).unwrap();
    /// assert_eq!(pool.size(), 1);
    /// ```
    ///
    /// [1]: Self::acquire_blocking
    /// [2]: Self::acquire_timeout
    pub fn release(&self, item: Pooled<T>) -> Result<(), ReleaseError<T>> {
        if item.pool_id() != self.shared.id {
            RELEASES_REJECTED.with(Event::observe_once);
            tracing::debug!(
                pool = %self.shared.id,
                item_pool = %item.pool_id(),
                "rejected release of item from another pool"
            );

            let problem = format!(
                "item was handed out by {} and cannot be released into {}",
                item.pool_id(),
                self.shared.id
            );

            return Err(ReleaseError::new(Error::InvalidArgument { problem }, item));
        }

        let entry = self
            .shared
            .retention
            .retain(item.into_arc(), Instant::now());

        self.lock().free.push(entry);

        ITEMS_RELEASED.with(Event::observe_once);

        self.shared.availability_changed.notify_one();

        Ok(())
    }

    /// Drops every registry entry that has been reclaimed and returns how many were dropped.
    ///
    /// Acquiring an object already forgets the reclaimed entries it scans past, so calling this
    /// is never required. It is useful to free up capacity (and memory held by expired
    /// entries) without taking an object out of the pool.
    ///
    /// # Example
    ///
    /// ```rust
    /// use soft_pool::{Retention, SoftPool};
    ///
    /// let pool = SoftPool::builder(|| 1_u8)
    ///     .retention(Retention::Weak)
    ///     .build();
    ///
    /// let item = pool.acquire().unwrap();
    ///
    /// // Weak retention - nobody else keeps the object alive once it is released.
    /// pool.release(item).unwrap();
    /// assert_eq!(pool.size(), 1);
    ///
    /// assert_eq!(pool.purge(), 1);
    /// assert_eq!(pool.size(), 0);
    /// assert_eq!(pool.live_instance_count(), 0);
    /// ```
    pub fn purge(&self) -> usize {
        let reclaimed = self.lock().purge(Instant::now());

        if reclaimed > 0 {
            // Reclaimed capacity may unblock any number of waiters.
            self.shared.availability_changed.notify_all();
        }

        reclaimed
    }

    /// The number of entries in the free registry.
    ///
    /// This is an upper bound on the number of objects that can be reused - some entries may
    /// refer to objects that have already been reclaimed.
    #[must_use]
    pub fn size(&self) -> usize {
        self.lock().free.len()
    }

    /// The number of objects the pool believes to be alive, whether in use or in the free
    /// registry.
    ///
    /// This is a best-effort value. Objects that have been reclaimed are only subtracted once
    /// the pool discovers their reclaimed registry entries.
    #[must_use]
    pub fn live_instance_count(&self) -> usize {
        self.lock().live_count
    }

    /// The maximum number of objects the pool allows to be alive at the same time.
    #[must_use]
    pub fn max_instances(&self) -> usize {
        self.lock().max_instances
    }

    /// Changes the maximum number of objects the pool allows to be alive at the same time.
    ///
    /// Lowering the limit below the current live count does not reclaim anything; the pool
    /// simply stops creating objects until enough of them have been reclaimed. Raising the
    /// limit wakes up all callers waiting for an object.
    ///
    /// # Panics
    ///
    /// Panics if `max_instances` is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use soft_pool::SoftPool;
    ///
    /// let pool = SoftPool::builder(|| 1_u8).max_instances(1).build();
    ///
    /// let first = pool.acquire().unwrap();
    /// assert!(pool.acquire().is_none());
    ///
    /// pool.set_max_instances(2);
    /// let second = pool.acquire().unwrap();
    /// # pool.release(first).unwrap();
    /// # pool.release(second).unwrap();
    /// ```
    pub fn set_max_instances(&self, max_instances: usize) {
        assert!(max_instances > 0, "SoftPool must allow at least one instance");

        let raised = {
            let mut state = self.lock();
            let raised = max_instances > state.max_instances;
            state.max_instances = max_instances;
            raised
        };

        tracing::debug!(pool = %self.shared.id, max_instances, "max instances changed");

        if raised {
            self.shared.availability_changed.notify_all();
        }
    }

    /// Turns the outcome of a successful checkout into an object for the caller.
    fn fulfill(&self, checkout: Checkout<T>) -> Pooled<T> {
        ITEMS_ACQUIRED.with(Event::observe_once);

        let item = match checkout {
            Checkout::Reused(item) => {
                ITEMS_REUSED.with(Event::observe_once);
                item
            }
            Checkout::Reserved => self.create(),
        };

        Pooled::new(item, self.shared.id)
    }

    /// Creates an object for a capacity reservation made by `checkout()`.
    fn create(&self) -> Arc<T> {
        // If the creator panics, we give back the reserved capacity before unwinding further.
        let reservation = scopeguard::guard((), |()| self.cancel_reservation());

        let item = Arc::new(self.shared.creator.create());

        ScopeGuard::into_inner(reservation);

        ITEMS_CREATED.with(Event::observe_once);
        tracing::debug!(pool = %self.shared.id, "created new pool item");

        item
    }

    fn cancel_reservation(&self) {
        {
            let mut state = self.lock();
            state.live_count = state
                .live_count
                .checked_sub(1)
                .expect(ERR_LIVE_COUNT_UNDERFLOW);
        }

        tracing::debug!(pool = %self.shared.id, "creator panicked, capacity reservation cancelled");

        self.shared.availability_changed.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.shared.state.lock().expect(ERR_POISONED_LOCK)
    }
}

impl<T> State<T> {
    /// Scans the free registry from the most recently released entry backward, forgetting
    /// reclaimed entries on the way. If that yields nothing, reserves capacity for a new object
    /// if the ceiling allows it.
    fn checkout(&mut self, now: Instant) -> Option<Checkout<T>> {
        let mut reclaimed: usize = 0;

        let reused = loop {
            let Some(entry) = self.free.pop() else {
                break None;
            };

            if let Some(item) = entry.resolve(now) {
                break Some(item);
            }

            self.forget_reclaimed();
            reclaimed = reclaimed.wrapping_add(1);
        };

        if reclaimed > 0 {
            ITEMS_RECLAIMED.with(|x| x.batch(reclaimed).observe_once());
            tracing::debug!(reclaimed, "forgot reclaimed pool items");
        }

        if let Some(item) = reused {
            return Some(Checkout::Reused(item));
        }

        if self.live_count < self.max_instances {
            self.live_count = self
                .live_count
                .checked_add(1)
                .expect(ERR_LIVE_COUNT_OVERFLOW);

            return Some(Checkout::Reserved);
        }

        None
    }

    fn purge(&mut self, now: Instant) -> usize {
        let before = self.free.len();

        self.free.retain(|entry| !entry.is_reclaimed(now));

        let reclaimed = before
            .checked_sub(self.free.len())
            .expect("retain() cannot grow the registry");

        for _ in 0..reclaimed {
            self.forget_reclaimed();
        }

        if reclaimed > 0 {
            ITEMS_RECLAIMED.with(|x| x.batch(reclaimed).observe_once());
            tracing::debug!(reclaimed, "purged reclaimed pool items");
        }

        reclaimed
    }

    fn forget_reclaimed(&mut self) {
        self.live_count = self
            .live_count
            .checked_sub(1)
            .expect(ERR_LIVE_COUNT_UNDERFLOW);
    }
}

impl<T> Clone for SoftPool<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for SoftPool<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut result = f.debug_struct("SoftPool");

        result
            .field(
                "item_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("id", &self.shared.id)
            .field("retention", &self.shared.retention);

        // Formatting must not block or panic, so the state is only shown if it is available.
        match self.shared.state.try_lock() {
            Ok(state) => result
                .field("size", &state.free.len())
                .field("live_count", &state.live_count)
                .field("max_instances", &state.max_instances),
            Err(TryLockError::WouldBlock) => {
                result.field("state", &std::format_args!("<locked>"))
            }
            Err(TryLockError::Poisoned(_)) => {
                result.field("state", &std::format_args!("<poisoned>"))
            }
        };

        result.finish()
    }
}
