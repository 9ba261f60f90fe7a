use std::fmt;

use thiserror::Error;

use crate::Pooled;

/// Errors that can occur when interacting with a [`SoftPool`][crate::SoftPool].
///
/// Running out of capacity is not an error - it is reported as an absent value by
/// [`acquire()`][crate::SoftPool::acquire] or waited out by
/// [`acquire_blocking()`][crate::SoftPool::acquire_blocking].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller passed a value that the pool cannot accept.
    #[error("invalid argument: {problem}")]
    InvalidArgument {
        /// A human-readable description of the problem.
        problem: String,
    },
}

/// A release that the pool refused to accept.
///
/// The pool does not take ownership of a rejected item. Use [`into_item()`][Self::into_item]
/// to get it back, for example to release it into the pool it actually came from.
///
/// # Example
///
/// ```rust
/// use soft_pool::{Error, SoftPool};
///
/// let pool_a = SoftPool::new(|| 1_u32);
/// let pool_b = SoftPool::new(|| 2_u32);
///
/// let item = pool_a.acquire().unwrap();
///
/// let rejected = pool_b.release(item).unwrap_err();
/// assert!(matches!(rejected.error(), Error::InvalidArgument { .. }));
///
/// // The item is handed back and can go home.
/// pool_a.release(rejected.into_item()).unwrap();
/// assert_eq!(pool_b.size(), 0);
/// ```
#[derive(Error)]
#[error("{error}")]
pub struct ReleaseError<T> {
    error: Error,
    item: Pooled<T>,
}

impl<T> ReleaseError<T> {
    pub(crate) fn new(error: Error, item: Pooled<T>) -> Self {
        Self { error, item }
    }

    /// The reason the release was rejected.
    #[must_use]
    pub fn error(&self) -> &Error {
        &self.error
    }

    /// Returns the rejected item to the caller.
    #[must_use]
    pub fn into_item(self) -> Pooled<T> {
        self.item
    }

    /// Discards the rejected item and returns the reason for the rejection.
    #[must_use]
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl<T> fmt::Debug for ReleaseError<T> {
    #[cfg_attr(test, mutants::skip)] // No API contract to test.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseError")
            .field("error", &self.error)
            .field("item", &self.item)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;
    use std::sync::Arc;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::PoolId;

    assert_impl_all!(Error: Send, Sync, Debug);
    assert_impl_all!(ReleaseError<u32>: Send, Sync, Debug);

    #[test]
    fn invalid_argument_displays_problem() {
        let error = Error::InvalidArgument {
            problem: "item belongs to another pool".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "invalid argument: item belongs to another pool"
        );
    }

    #[test]
    fn release_error_hands_item_back() {
        let item = Pooled::new(Arc::new(42_u32), PoolId::next());
        let pool_id = item.pool_id();

        let rejected = ReleaseError::new(
            Error::InvalidArgument {
                problem: "test".to_string(),
            },
            item,
        );

        assert_eq!(rejected.to_string(), "invalid argument: test");

        let item = rejected.into_item();
        assert_eq!(*item, 42);
        assert_eq!(item.pool_id(), pool_id);
    }

    #[test]
    fn release_error_converts_into_error() {
        let rejected = ReleaseError::new(
            Error::InvalidArgument {
                problem: "test".to_string(),
            },
            Pooled::new(Arc::new(()), PoolId::next()),
        );

        let error = rejected.into_error();
        assert!(matches!(error, Error::InvalidArgument { .. }));
    }
}
