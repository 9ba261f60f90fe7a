/// Manufactures new objects on behalf of a [`SoftPool`][crate::SoftPool].
///
/// The pool owns its creator for the lifetime of the pool and calls [`create()`][Self::create]
/// whenever demand for objects exceeds what the free registry can supply and the pool is
/// still below its capacity ceiling. The pool knows nothing about how objects are built or what
/// they represent; any state the creator keeps (e.g. an id generator) is its own concern.
///
/// Any `Fn() -> T` closure is a creator, which is usually the most convenient way to supply one.
///
/// # Panics
///
/// If `create()` panics, the panic propagates to the caller that tried to acquire an object.
/// The pool does not count the failed attempt against its capacity.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// use soft_pool::{Creator, SoftPool};
///
/// #[derive(Default)]
/// struct TicketCreator {
///     next_id: AtomicU64,
/// }
///
/// impl Creator<u64> for TicketCreator {
///     fn create(&self) -> u64 {
///         self.next_id.fetch_add(1, Ordering::Relaxed) + 1
///     }
/// }
///
/// let pool = SoftPool::new(TicketCreator::default());
///
/// let ticket = pool.acquire().unwrap();
/// assert_eq!(*ticket, 1);
/// ```
pub trait Creator<T> {
    /// Returns a newly created object.
    fn create(&self) -> T;
}

impl<T, F> Creator<T> for F
where
    F: Fn() -> T,
{
    #[inline]
    fn create(&self) -> T {
        self()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn create_via_trait<C: Creator<String>>(creator: &C) -> String {
        creator.create()
    }

    #[test]
    fn closure_is_creator() {
        let calls = AtomicUsize::new(0);

        let creator = || {
            let n = calls.fetch_add(1, Ordering::Relaxed);
            format!("item-{n}")
        };

        assert_eq!(create_via_trait(&creator), "item-0");
        assert_eq!(create_via_trait(&creator), "item-1");
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn boxed_creator_is_usable_as_trait_object() {
        let creator: Box<dyn Creator<u32> + Send + Sync> = Box::new(|| 7);

        assert_eq!(creator.create(), 7);
    }
}
