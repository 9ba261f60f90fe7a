use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{self, AtomicU64};

/// Identifies a [`SoftPool`][crate::SoftPool] within the current process.
///
/// Every pool receives a distinct identifier when it is built. Items remember the identifier of
/// the pool that handed them out, which allows a pool to reject items that belong elsewhere.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PoolId(u64);

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(1);

impl PoolId {
    pub(crate) fn next() -> Self {
        // Relaxed is enough - we only need uniqueness, not ordering with other memory.
        Self(NEXT_POOL_ID.fetch_add(1, atomic::Ordering::Relaxed))
    }
}

impl fmt::Display for PoolId {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// An object handed out by a [`SoftPool`][crate::SoftPool].
///
/// The object is accessed by dereferencing the handle. Give the object back to the pool via
/// [`SoftPool::release()`][crate::SoftPool::release] once you are done with it, so that the
/// next caller can reuse it.
///
/// Dropping a [`Pooled<T>`] instead of releasing it does not return the object to the pool and
/// the pool keeps counting the object as live. Unreleased objects therefore permanently consume
/// capacity of a bounded pool.
///
/// # Keeping released objects alive
///
/// Under [`Retention::Weak`][crate::Retention::Weak], the pool does not keep released objects
/// alive. Call [`share()`][Self::share] before releasing to obtain a strong reference that
/// keeps the object alive (and therefore reusable) for as long as you hold it.
///
/// # Example
///
/// ```rust
/// use soft_pool::SoftPool;
///
/// let pool = SoftPool::new(|| String::from("hello"));
///
/// let item = pool.acquire().unwrap();
/// assert_eq!(item.len(), 5);
/// assert_eq!(item.pool_id(), pool.id());
///
/// pool.release(item).unwrap();
/// ```
pub struct Pooled<T> {
    item: Arc<T>,
    pool_id: PoolId,
}

impl<T> Pooled<T> {
    pub(crate) fn new(item: Arc<T>, pool_id: PoolId) -> Self {
        Self { item, pool_id }
    }

    /// The identifier of the pool that handed out this object.
    #[must_use]
    #[inline]
    pub fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    /// Returns an additional strong reference to the object.
    ///
    /// While any such reference exists, the object cannot be reclaimed, even if it has been
    /// released into a pool that only retains it weakly.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::sync::Arc;
    ///
    /// use soft_pool::{Retention, SoftPool};
    ///
    /// let pool = SoftPool::builder(|| 5_u16)
    ///     .retention(Retention::Weak)
    ///     .build();
    ///
    /// let item = pool.acquire().unwrap();
    /// let keepalive = item.share();
    /// pool.release(item).unwrap();
    ///
    /// // The same object comes back because `keepalive` prevented it from being reclaimed.
    /// let again = pool.acquire().unwrap();
    /// assert!(Arc::ptr_eq(&keepalive, &again.share()));
    /// ```
    #[must_use]
    pub fn share(&self) -> Arc<T> {
        Arc::clone(&self.item)
    }

    /// Returns a mutable reference to the object if this handle is its only reference.
    ///
    /// Returns `None` while any reference obtained from [`share()`][Self::share] is still
    /// alive. Changes made through the returned reference stay with the object when it is
    /// released, so the next caller to reuse it sees them.
    ///
    /// # Example
    ///
    /// ```rust
    /// use soft_pool::SoftPool;
    ///
    /// let pool = SoftPool::new(Vec::<u8>::new);
    ///
    /// let mut buffer = pool.acquire().unwrap();
    /// buffer.get_mut().unwrap().extend_from_slice(b"hello");
    /// pool.release(buffer).unwrap();
    ///
    /// let buffer = pool.acquire().unwrap();
    /// assert_eq!(buffer.as_slice(), b"hello");
    /// ```
    #[must_use]
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        Arc::get_mut(&mut self.item)
    }

    pub(crate) fn into_arc(self) -> Arc<T> {
        self.item
    }
}

impl<T> Deref for Pooled<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.item
    }
}

impl<T> AsRef<T> for Pooled<T> {
    #[inline]
    fn as_ref(&self) -> &T {
        &self.item
    }
}

impl<T> fmt::Debug for Pooled<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled")
            .field(
                "item_type",
                &std::format_args!("{}", std::any::type_name::<T>()),
            )
            .field("pool_id", &self.pool_id)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use static_assertions::{assert_impl_all, assert_not_impl_any};

    use super::*;

    assert_impl_all!(Pooled<u32>: Send, Sync);
    assert_impl_all!(Pooled<String>: Send, Sync);
    assert_not_impl_any!(Pooled<Cell<u32>>: Sync);
    assert_not_impl_any!(Pooled<Rc<u32>>: Send, Sync);

    // A pooled object has exactly one owner at a time, otherwise releasing one handle while
    // another is still in use would hand the same object to two callers.
    assert_not_impl_any!(Pooled<u32>: Clone);

    assert_impl_all!(PoolId: Send, Sync, Copy);

    #[test]
    fn pool_ids_are_unique() {
        let a = PoolId::next();
        let b = PoolId::next();

        assert_ne!(a, b);
    }

    #[test]
    fn deref_and_as_ref_reach_item() {
        let pooled = Pooled::new(Arc::new(String::from("abc")), PoolId::next());

        assert_eq!(pooled.len(), 3);
        assert_eq!(pooled.as_ref(), "abc");
    }

    #[test]
    fn get_mut_on_unshared_item() {
        let mut pooled = Pooled::new(Arc::new(vec![1_u8]), PoolId::next());

        pooled.get_mut().unwrap().push(2);

        assert_eq!(pooled.as_slice(), &[1, 2]);
    }

    #[test]
    fn get_mut_refused_while_shared() {
        let mut pooled = Pooled::new(Arc::new(7_u32), PoolId::next());

        let shared = pooled.share();
        assert!(pooled.get_mut().is_none());

        drop(shared);
        *pooled.get_mut().unwrap() = 8;
        assert_eq!(*pooled, 8);
    }

    #[test]
    fn share_returns_same_allocation() {
        let pooled = Pooled::new(Arc::new(10_u64), PoolId::next());

        let shared = pooled.share();
        let inner = pooled.into_arc();

        assert!(Arc::ptr_eq(&shared, &inner));
        assert_eq!(Arc::strong_count(&inner), 2);
    }
}
