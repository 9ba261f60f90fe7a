use std::fmt;
use std::marker::PhantomData;

use crate::{Creator, DEFAULT_IDLE_TTL, Retention, SoftPool};

/// Builder for creating an instance of [`SoftPool`].
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`SoftPool::new()`][1] is an unbounded pool that keeps
/// released objects alive for reuse until they have been idle for [`DEFAULT_IDLE_TTL`].
///
/// # Examples
///
/// ```
/// use soft_pool::{Retention, SoftPool};
///
/// let pool = SoftPool::builder(|| String::new())
///     .max_instances(8)
///     .retention(Retention::Strong)
///     .build();
///
/// assert_eq!(pool.max_instances(), 8);
/// ```
///
/// [1]: SoftPool::new
#[must_use]
pub struct SoftPoolBuilder<T, C> {
    creator: C,
    max_instances: usize,
    retention: Retention,

    _item: PhantomData<fn() -> T>,
}

impl<T, C> fmt::Debug for SoftPoolBuilder<T, C> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftPoolBuilder")
            .field(
                "item_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field(
                "creator_type",
                &std::format_args!("{}", std::any::type_name::<C>()),
            )
            .field("max_instances", &self.max_instances)
            .field("retention", &self.retention)
            .finish()
    }
}

impl<T, C> SoftPoolBuilder<T, C>
where
    C: Creator<T> + Send + Sync + 'static,
{
    pub(crate) fn new(creator: C) -> Self {
        Self {
            creator,
            max_instances: usize::MAX,
            retention: Retention::default(),
            _item: PhantomData,
        }
    }

    /// Sets the maximum number of objects the pool allows to exist at the same time.
    ///
    /// Objects count toward this limit from the moment they are created until the pool
    /// discovers that they have been reclaimed. The default is `usize::MAX`, which is
    /// effectively unbounded.
    ///
    /// # Panics
    ///
    /// Panics if `max_instances` is zero, as such a pool could never hand out anything.
    ///
    /// # Examples
    ///
    /// ```
    /// use soft_pool::SoftPool;
    ///
    /// let pool = SoftPool::builder(|| 0_u64).max_instances(1).build();
    ///
    /// let only = pool.acquire().unwrap();
    /// assert!(pool.acquire().is_none());
    /// # pool.release(only).unwrap();
    /// ```
    pub fn max_instances(mut self, max_instances: usize) -> Self {
        assert!(max_instances > 0, "SoftPool must allow at least one instance");

        self.max_instances = max_instances;
        self
    }

    /// Sets the [retention policy][Retention] for released objects.
    ///
    /// # Examples
    ///
    /// ```
    /// use soft_pool::{Retention, SoftPool};
    ///
    /// let pool = SoftPool::builder(|| 0_u64)
    ///     .retention(Retention::Strong)
    ///     .build();
    ///
    /// let item = pool.acquire().unwrap();
    /// pool.release(item).unwrap();
    ///
    /// // Strongly retained objects stay in the pool even though nobody else references them.
    /// assert_eq!(pool.purge(), 0);
    /// assert_eq!(pool.size(), 1);
    /// ```
    pub fn retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use soft_pool::SoftPool;
    ///
    /// let pool = SoftPool::builder(|| 0_u64).build();
    ///
    /// assert_eq!(pool.size(), 0);
    /// assert_eq!(pool.live_instance_count(), 0);
    /// ```
    #[must_use]
    pub fn build(self) -> SoftPool<T> {
        SoftPool::new_inner(Box::new(self.creator), self.max_instances, self.retention)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn defaults_are_unbounded_with_idle_ttl() {
        let pool = SoftPoolBuilder::new(|| 1_u8).build();

        assert_eq!(pool.max_instances(), usize::MAX);
        assert_eq!(pool.retention(), Retention::Ttl(DEFAULT_IDLE_TTL));
    }

    #[test]
    fn settings_are_applied() {
        let pool = SoftPoolBuilder::new(|| 1_u8)
            .max_instances(3)
            .retention(Retention::Ttl(Duration::from_millis(250)))
            .build();

        assert_eq!(pool.max_instances(), 3);
        assert_eq!(
            pool.retention(),
            Retention::Ttl(Duration::from_millis(250))
        );
    }

    #[test]
    #[should_panic]
    fn zero_max_instances_panics() {
        drop(SoftPoolBuilder::new(|| 1_u8).max_instances(0));
    }
}
