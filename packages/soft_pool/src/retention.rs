use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

/// How long a released object may sit idle in a pool with the default retention policy.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60);

/// How a [`SoftPool`][crate::SoftPool] holds on to objects that have been released into it.
///
/// The retention policy decides when a released object counts as reclaimed. The pool notices
/// reclaimed objects when it scans its free registry, at which point it forgets them and frees
/// up the capacity they occupied.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use soft_pool::{Retention, SoftPool};
///
/// let pool = SoftPool::builder(|| [0_u8; 64])
///     .retention(Retention::Ttl(Duration::from_secs(30)))
///     .build();
///
/// assert_eq!(pool.retention(), Retention::Ttl(Duration::from_secs(30)));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Retention {
    /// The pool keeps only a weak reference to released objects.
    ///
    /// A released object remains reusable only while something outside the pool holds a
    /// strong reference to it (see [`Pooled::share()`][crate::Pooled::share]). Once the last
    /// strong reference is dropped, the object is gone.
    Weak,

    /// The pool keeps released objects alive until they are reused. Nothing is ever reclaimed.
    Strong,

    /// The pool keeps released objects alive, but an object that has been idle in the pool for
    /// longer than the given duration counts as reclaimed.
    ///
    /// This is the default policy, with an idle time of [`DEFAULT_IDLE_TTL`].
    Ttl(Duration),
}

impl Default for Retention {
    fn default() -> Self {
        Self::Ttl(DEFAULT_IDLE_TTL)
    }
}

impl Retention {
    /// Wraps a released object into a free registry entry according to this policy.
    pub(crate) fn retain<T>(self, item: Arc<T>, now: Instant) -> FreeEntry<T> {
        match self {
            Self::Weak => FreeEntry::Weak(Arc::downgrade(&item)),
            Self::Strong => FreeEntry::Strong(item),
            Self::Ttl(ttl) => match now.checked_add(ttl) {
                Some(expires_at) => FreeEntry::Expiring { item, expires_at },
                // A TTL too long to represent is as good as no TTL at all.
                None => FreeEntry::Strong(item),
            },
        }
    }
}

/// An object waiting in the free registry of a pool.
pub(crate) enum FreeEntry<T> {
    Weak(Weak<T>),
    Strong(Arc<T>),
    Expiring { item: Arc<T>, expires_at: Instant },
}

impl<T> FreeEntry<T> {
    /// Consumes the entry, returning the object if it has not been reclaimed.
    pub(crate) fn resolve(self, now: Instant) -> Option<Arc<T>> {
        match self {
            Self::Weak(weak) => weak.upgrade(),
            Self::Strong(item) => Some(item),
            Self::Expiring { item, expires_at } => (now < expires_at).then_some(item),
        }
    }

    /// Whether the entry no longer resolves to a live object.
    ///
    /// For weak entries this is only a snapshot - a live entry may get reclaimed right after.
    pub(crate) fn is_reclaimed(&self, now: Instant) -> bool {
        match self {
            Self::Weak(weak) => weak.strong_count() == 0,
            Self::Strong(_) => false,
            Self::Expiring { expires_at, .. } => now >= *expires_at,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Retention: Send, Sync, Copy);

    #[test]
    fn default_is_idle_ttl() {
        assert_eq!(Retention::default(), Retention::Ttl(DEFAULT_IDLE_TTL));
    }

    #[test]
    fn weak_entry_resolves_while_strong_reference_exists() {
        let now = Instant::now();
        let item = Arc::new(1_u32);

        let entry = Retention::Weak.retain(Arc::clone(&item), now);
        assert!(!entry.is_reclaimed(now));

        let resolved = entry.resolve(now).unwrap();
        assert!(Arc::ptr_eq(&resolved, &item));
    }

    #[test]
    fn weak_entry_is_reclaimed_after_last_strong_reference_drops() {
        let now = Instant::now();

        let entry = Retention::Weak.retain(Arc::new(1_u32), now);

        assert!(entry.is_reclaimed(now));
        assert!(entry.resolve(now).is_none());
    }

    #[test]
    fn strong_entry_is_never_reclaimed() {
        let now = Instant::now();

        let entry = Retention::Strong.retain(Arc::new(1_u32), now);

        let much_later = now + Duration::from_secs(3600);
        assert!(!entry.is_reclaimed(much_later));
        assert_eq!(*entry.resolve(much_later).unwrap(), 1);
    }

    #[test]
    fn ttl_entry_expires() {
        let now = Instant::now();
        let ttl = Duration::from_secs(10);

        let entry = Retention::Ttl(ttl).retain(Arc::new(1_u32), now);

        assert!(!entry.is_reclaimed(now + Duration::from_secs(9)));
        assert!(entry.is_reclaimed(now + ttl));
        assert!(entry.resolve(now + ttl).is_none());
    }

    #[test]
    fn ttl_entry_resolves_before_expiry() {
        let now = Instant::now();

        let entry = Retention::Ttl(Duration::from_secs(10)).retain(Arc::new(1_u32), now);

        assert_eq!(*entry.resolve(now + Duration::from_secs(1)).unwrap(), 1);
    }

    #[test]
    fn unrepresentable_ttl_never_expires() {
        let now = Instant::now();

        let entry = Retention::Ttl(Duration::MAX).retain(Arc::new(1_u32), now);

        assert!(matches!(entry, FreeEntry::Strong(_)));
    }
}
