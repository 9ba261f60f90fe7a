#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! This package provides [`SoftPool`], a bounded object pool that hands out reusable objects
//! but does not insist on keeping released objects alive.
//!
//! Objects are manufactured on demand by a [`Creator`] supplied when the pool is built. A
//! caller acquires an object, uses it and releases it back to the pool, after which the pool
//! may hand the same object to the next caller. The pool caps the number of objects it has
//! manufactured and not yet seen reclaimed; once the cap is reached, acquiring either returns
//! nothing or waits for a release.
//!
//! # Reclamation
//!
//! Released objects are held according to a [`Retention`] policy. The default policy keeps a
//! released object alive until it is reused or has sat idle for [`DEFAULT_IDLE_TTL`].
//! [`Retention::Strong`] keeps released objects alive forever. With [`Retention::Weak`] the
//! pool only remembers where a released object can be found, so the object survives in the
//! pool only while something else keeps a strong reference to it (see [`Pooled::share()`]).
//!
//! When the pool discovers that a released object has been reclaimed, it forgets the object
//! and frees up the capacity it occupied.
//!
//! # Example
//!
//! ```rust
//! use soft_pool::{Retention, SoftPool};
//!
//! let pool = SoftPool::builder(|| vec![0_u8; 1024])
//!     .max_instances(2)
//!     .retention(Retention::Strong)
//!     .build();
//!
//! let first = pool.acquire().unwrap();
//! let second = pool.acquire().unwrap();
//!
//! // The pool is at capacity.
//! assert!(pool.acquire().is_none());
//!
//! pool.release(first).unwrap();
//!
//! // The released buffer is reused instead of creating a new one.
//! let third = pool.acquire().unwrap();
//! assert_eq!(third.len(), 1024);
//! assert_eq!(pool.live_instance_count(), 2);
//! # pool.release(second).unwrap();
//! # pool.release(third).unwrap();
//! ```
//!
//! # Metrics
//!
//! The pool reports its activity as [`nm`] events whose names start with `soft_pool_`,
//! and emits [`tracing`] events for creation, reclamation and rejected releases.

mod builder;
mod constants;
mod creator;
mod error;
mod metrics;
mod pool;
mod pooled;
mod retention;

pub use builder::*;
pub use creator::*;
pub use error::*;
pub use pool::*;
pub use pooled::*;
pub use retention::*;
