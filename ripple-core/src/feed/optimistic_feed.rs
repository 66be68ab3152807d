use std::sync::Mutex;
use std::sync::atomic::{AtomicPtr, Ordering};

use super::{Feed, FeedNode, NodePtr, Post};
use crate::synchronization::RwLock;

// Holds unlinked nodes until the feed itself is dropped.
//
// A mutator that released the shared lock still holds a raw pointer to its
// candidate predecessor; a concurrent writer may unlink that node before
// the mutator regains the exclusive lock. Deferring deallocation to the
// end of the feed's life keeps such pointers dereferenceable, and the
// `removed` flag makes the staleness detectable during validation.
struct Graveyard {
    retired: Mutex<Vec<NodePtr>>,
}

// Safety: the raw pointers are only freed once, on drop, after every
// thread that could reach them has let go of the feed.
unsafe impl Send for Graveyard {}
unsafe impl Sync for Graveyard {}

impl Graveyard {
    fn new() -> Self {
        Graveyard {
            retired: Mutex::new(Vec::new()),
        }
    }

    /// Hand over an unlinked node for deferred deallocation.
    ///
    /// # Safety
    /// - `node` must be unlinked from the list and marked removed
    /// - Must be retired at most once
    unsafe fn retire(&self, node: NodePtr) {
        self.retired.lock().unwrap().push(node);
    }
}

impl Drop for Graveyard {
    fn drop(&mut self) {
        let nodes = self.retired.get_mut().unwrap();
        for node in nodes.drain(..) {
            unsafe { FeedNode::dealloc_ptr(node) };
        }
    }
}

/// Optimistic feed: shared-lock traversal, exclusive re-validated mutation.
///
/// Mutators locate their insertion or deletion site while holding only the
/// shared lock, then trade it for the exclusive lock and re-check that the
/// site is still the right one. If the list changed underneath them they
/// retry from the top. Readers pay nothing extra; writers only serialize
/// for the short splice itself rather than the whole traversal.
///
/// A permanent sentinel head (timestamp `-1.0`, never removed) makes
/// "insert before the first post" the same splice as any other, and never
/// shows up in snapshots.
pub struct OptimisticFeed<L: RwLock> {
    // Points at the sentinel for the lifetime of the feed.
    head: AtomicPtr<FeedNode>,
    lock: L,
    graveyard: Graveyard,
}

impl<L: RwLock> OptimisticFeed<L> {
    pub fn new() -> Self {
        let sentinel = Box::into_raw(Box::new(FeedNode::new_sentinel()));
        OptimisticFeed {
            head: AtomicPtr::new(sentinel),
            lock: L::default(),
            graveyard: Graveyard::new(),
        }
    }

    #[inline]
    fn sentinel(&self) -> NodePtr {
        self.head.load(Ordering::Acquire)
    }

    // Walk to the node after which a post with timestamp `ts` belongs:
    // the last node whose timestamp is strictly greater (or the sentinel).
    // Stopping before the first equal timestamp keeps ties LIFO.
    //
    // Caller must hold at least the shared lock.
    fn locate_insert(&self, ts: f64) -> NodePtr {
        let mut cur = self.sentinel();
        unsafe {
            loop {
                let next = (*cur).get_next();
                if next.is_null() || (*next).timestamp() <= ts {
                    return cur;
                }
                cur = next;
            }
        }
    }

    // Walk to the predecessor of the first node whose timestamp equals
    // `ts`, or to the tail if there is none.
    //
    // Caller must hold at least the shared lock.
    fn locate_remove(&self, ts: f64) -> NodePtr {
        let mut cur = self.sentinel();
        unsafe {
            loop {
                let next = (*cur).get_next();
                if next.is_null() || (*next).timestamp() == ts {
                    return cur;
                }
                cur = next;
            }
        }
    }

    // An insertion site found under the shared lock is still valid iff the
    // predecessor was not logically deleted in the meantime (splicing
    // behind a removed node would be lost) and no node with a strictly
    // greater timestamp slipped in after it (the predecessor would be
    // lagging). An equal-timestamp arrival does not invalidate the site:
    // the new post goes in front of it either way.
    //
    // The sentinel's `removed` is permanently false, so the head-prefix
    // case needs no separate predicate.
    fn insert_still_valid(pred: NodePtr, ts: f64) -> bool {
        unsafe {
            if (*pred).is_removed() {
                return false;
            }
            let next = (*pred).get_next();
            next.is_null() || (*next).timestamp() <= ts
        }
    }

    // A deletion site is still valid iff the predecessor is alive and its
    // successor is still the matching node (or the tail, in which case the
    // match disappeared and the remove fails).
    fn remove_still_valid(pred: NodePtr, ts: f64) -> bool {
        unsafe {
            if (*pred).is_removed() {
                return false;
            }
            let next = (*pred).get_next();
            next.is_null() || (*next).timestamp() == ts
        }
    }
}

impl<L: RwLock> Default for OptimisticFeed<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: RwLock> Feed for OptimisticFeed<L> {
    fn add(&self, body: String, timestamp: f64) {
        let new_node = FeedNode::alloc(body, timestamp);

        loop {
            self.lock.acquire_shared();
            let pred = self.locate_insert(timestamp);
            self.lock.release_shared();

            self.lock.acquire_exclusive();
            if Self::insert_still_valid(pred, timestamp) {
                unsafe {
                    (*new_node).set_next((*pred).get_next());
                    (*pred).set_next(new_node);
                }
                self.lock.release_exclusive();
                return;
            }
            // The list changed between the locks; retry from the top.
            self.lock.release_exclusive();
        }
    }

    fn remove(&self, timestamp: f64) -> bool {
        loop {
            self.lock.acquire_shared();

            // Empty feed: nothing to do, no exclusive lock needed.
            if unsafe { (*self.sentinel()).get_next().is_null() } {
                self.lock.release_shared();
                return false;
            }

            let pred = self.locate_remove(timestamp);
            self.lock.release_shared();

            self.lock.acquire_exclusive();
            if Self::remove_still_valid(pred, timestamp) {
                let target = unsafe { (*pred).get_next() };

                let removed = if target.is_null() {
                    // Reached the tail without a match.
                    false
                } else {
                    unsafe {
                        // Mark before unlinking, so a thread that located
                        // this node as its predecessor sees it go stale.
                        (*target).mark_removed();
                        (*pred).set_next((*target).get_next());
                        self.graveyard.retire(target);
                    }
                    true
                };

                self.lock.release_exclusive();
                return removed;
            }
            self.lock.release_exclusive();
        }
    }

    fn contains(&self, timestamp: f64) -> bool {
        // The shared lock is held for the whole walk: writers are excluded,
        // so the traversal sees a consistent list with no removed nodes.
        self.lock.acquire_shared();

        let mut cur = unsafe { (*self.sentinel()).get_next() };
        let mut found = false;
        while !cur.is_null() {
            unsafe {
                if (*cur).timestamp() == timestamp {
                    found = true;
                    break;
                }
                cur = (*cur).get_next();
            }
        }

        self.lock.release_shared();
        found
    }

    fn snapshot(&self) -> Vec<Post> {
        self.lock.acquire_shared();

        let mut posts = Vec::new();
        let mut cur = unsafe { (*self.sentinel()).get_next() };
        while !cur.is_null() {
            unsafe {
                posts.push((*cur).to_post());
                cur = (*cur).get_next();
            }
        }

        self.lock.release_shared();
        posts
    }
}

impl<L: RwLock> Drop for OptimisticFeed<L> {
    fn drop(&mut self) {
        // Free the live chain including the sentinel; the graveyard frees
        // the unlinked nodes itself.
        let mut cur = self.sentinel();
        while !cur.is_null() {
            unsafe {
                let next = (*cur).get_next();
                FeedNode::dealloc_ptr(cur);
                cur = next;
            }
        }
    }
}
