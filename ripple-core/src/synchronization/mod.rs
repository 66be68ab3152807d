//! Preemptive synchronization primitives.
//!
//! # Organization
//!
//! - [`rw_lock`] - The [`RwLock`] trait and the reader cap shared by both
//!   implementations
//! - [`simple_rw_lock`] - Single-condition-variable reader/writer lock
//! - [`fast_rw_lock`] - Three-condition-variable reader/writer lock that
//!   separates blocked readers, queued writers and the draining writer
//! - [`wait_group`] - Counter with a zero-wait, used for request draining
//!
//! # Usage
//!
//! Feeds are generic over the lock type `L: RwLock`:
//!
//! ```ignore
//! use ripple_core::{CoarseFeed, FastRwLock, Feed};
//!
//! let feed: CoarseFeed<FastRwLock> = CoarseFeed::new();
//! feed.add("hello".to_string(), 1.0);
//! ```

pub mod fast_rw_lock;
pub mod rw_lock;
pub mod simple_rw_lock;
pub mod wait_group;

pub use fast_rw_lock::FastRwLock;
pub use rw_lock::{MAX_READERS, RwLock};
pub use simple_rw_lock::SimpleRwLock;
pub use wait_group::WaitGroup;
