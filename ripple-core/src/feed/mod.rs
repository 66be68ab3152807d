//! Timestamp-sorted feed, shared by all worker threads.
//!
//! # Organization
//!
//! - [`coarse_feed`] - Every operation holds the lock for its full duration
//! - [`optimistic_feed`] - Traversal under a shared lock, mutation sites
//!   re-validated under the exclusive lock
//!
//! Both variants are generic over the lock type `L: RwLock`:
//!
//! ```ignore
//! use ripple_core::{FastRwLock, Feed, OptimisticFeed};
//!
//! let feed: OptimisticFeed<FastRwLock> = OptimisticFeed::new();
//! feed.add("first".to_string(), 2.0);
//! feed.add("second".to_string(), 1.0);
//! assert!(feed.contains(1.0));
//! ```

use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use serde::{Deserialize, Serialize};

pub mod coarse_feed;
pub mod optimistic_feed;

pub use coarse_feed::CoarseFeed;
pub use optimistic_feed::OptimisticFeed;

/// A feed entry as seen by external callers.
///
/// Only the body and timestamp are exposed; the list linkage stays
/// internal to the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub body: String,
    pub timestamp: f64,
}

/// The four operations every feed variant supports.
///
/// The feed is ordered by timestamp, most recent first. Among posts with
/// equal timestamps the most recently added appears first. All four
/// operations are linearizable with respect to each other.
pub trait Feed: Send + Sync {
    /// Insert a post. The feed stays sorted by timestamp descending; a new
    /// post goes before any existing post with an equal timestamp.
    fn add(&self, body: String, timestamp: f64);

    /// Remove the first post whose timestamp equals `timestamp`. Returns
    /// false if no post matched.
    fn remove(&self, timestamp: f64) -> bool;

    /// Whether a post with the given timestamp exists at some point during
    /// the call.
    fn contains(&self, timestamp: f64) -> bool;

    /// The feed contents head-to-tail at some point during the call.
    fn snapshot(&self) -> Vec<Post>;
}

pub(crate) type NodePtr = *mut FeedNode;

/// A post as stored in the list. Shared by both feed variants; the
/// `removed` flag is only ever set by the optimistic one.
#[derive(Debug)]
pub(crate) struct FeedNode {
    body: String,
    timestamp: f64,
    next: AtomicPtr<FeedNode>,
    removed: AtomicBool,
}

impl FeedNode {
    pub(crate) fn new(body: String, timestamp: f64) -> Self {
        FeedNode {
            body,
            timestamp,
            next: AtomicPtr::new(ptr::null_mut()),
            removed: AtomicBool::new(false),
        }
    }

    /// The optimistic variant's permanent head. Its timestamp sits below
    /// every real one and its `removed` flag is never set, so head
    /// insertion needs no special case.
    pub(crate) fn new_sentinel() -> Self {
        FeedNode::new(String::new(), -1.0)
    }

    /// Allocate a node on the heap and leak it to a raw pointer.
    pub(crate) fn alloc(body: String, timestamp: f64) -> NodePtr {
        Box::into_raw(Box::new(FeedNode::new(body, timestamp)))
    }

    /// Deallocate a node previously produced by [`FeedNode::alloc`].
    ///
    /// # Safety
    /// - `ptr` must have been allocated by this module
    /// - Must only be called once, and the node must be unreachable
    pub(crate) unsafe fn dealloc_ptr(ptr: NodePtr) {
        unsafe { drop(Box::from_raw(ptr)) };
    }

    #[inline]
    pub(crate) fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Load next pointer (Acquire ordering)
    #[inline]
    pub(crate) fn get_next(&self) -> NodePtr {
        self.next.load(Ordering::Acquire)
    }

    /// Store next pointer (Release ordering)
    #[inline]
    pub(crate) fn set_next(&self, ptr: NodePtr) {
        self.next.store(ptr, Ordering::Release)
    }

    #[inline]
    pub(crate) fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Flag this node as logically deleted. Set before the node is
    /// unlinked, so a thread still holding a reference can tell that its
    /// anchor went stale.
    #[inline]
    pub(crate) fn mark_removed(&self) {
        self.removed.store(true, Ordering::Release)
    }

    pub(crate) fn to_post(&self) -> Post {
        Post {
            body: self.body.clone(),
            timestamp: self.timestamp,
        }
    }
}
