use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use super::{Feed, FeedNode, NodePtr, Post};
use crate::synchronization::RwLock;

/// Coarse-grained feed: one lock around the whole list.
///
/// Mutators hold the lock exclusively for their entire traversal, readers
/// hold it shared, so plain single-linked-list manipulation is safe and no
/// sentinel or logical-deletion flag is needed. Removed nodes are freed on
/// the spot: every traversal holds at least the shared lock, so nobody can
/// still be standing on an unlinked node.
pub struct CoarseFeed<L: RwLock> {
    head: AtomicPtr<FeedNode>,
    lock: L,
}

impl<L: RwLock> CoarseFeed<L> {
    pub fn new() -> Self {
        CoarseFeed {
            head: AtomicPtr::new(ptr::null_mut()),
            lock: L::default(),
        }
    }

    #[inline]
    fn head(&self) -> NodePtr {
        self.head.load(Ordering::Acquire)
    }
}

impl<L: RwLock> Default for CoarseFeed<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: RwLock> Feed for CoarseFeed<L> {
    fn add(&self, body: String, timestamp: f64) {
        let new_node = FeedNode::alloc(body, timestamp);

        self.lock.acquire_exclusive();

        let head = self.head();

        unsafe {
            // Empty feed, or at least as recent as the current head: the
            // new post becomes the head. `>=` keeps equal timestamps LIFO.
            if head.is_null() || timestamp >= (*head).timestamp() {
                (*new_node).set_next(head);
                self.head.store(new_node, Ordering::Release);
            } else {
                // Walk to the last node whose timestamp is strictly
                // greater, then splice in after it. Stopping before the
                // first equal timestamp keeps ties LIFO.
                let mut cur = head;
                loop {
                    let next = (*cur).get_next();
                    if next.is_null() || (*next).timestamp() <= timestamp {
                        break;
                    }
                    cur = next;
                }
                (*new_node).set_next((*cur).get_next());
                (*cur).set_next(new_node);
            }
        }

        self.lock.release_exclusive();
    }

    fn remove(&self, timestamp: f64) -> bool {
        self.lock.acquire_exclusive();

        let head = self.head();

        let removed = unsafe {
            if head.is_null() {
                false
            } else if (*head).timestamp() == timestamp {
                self.head.store((*head).get_next(), Ordering::Release);
                FeedNode::dealloc_ptr(head);
                true
            } else {
                let mut cur = head;
                loop {
                    let next = (*cur).get_next();
                    if next.is_null() || (*next).timestamp() == timestamp {
                        break;
                    }
                    cur = next;
                }

                let target = (*cur).get_next();
                if target.is_null() {
                    // Reached the tail without a match.
                    false
                } else {
                    (*cur).set_next((*target).get_next());
                    FeedNode::dealloc_ptr(target);
                    true
                }
            }
        };

        self.lock.release_exclusive();
        removed
    }

    fn contains(&self, timestamp: f64) -> bool {
        self.lock.acquire_shared();

        let mut cur = self.head();
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
        let mut cur = self.head();
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

impl<L: RwLock> Drop for CoarseFeed<L> {
    fn drop(&mut self) {
        let mut cur = self.head();
        while !cur.is_null() {
            unsafe {
                let next = (*cur).get_next();
                FeedNode::dealloc_ptr(cur);
                cur = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synchronization::SimpleRwLock;

    #[test]
    fn test_add_keeps_descending_order() {
        let feed: CoarseFeed<SimpleRwLock> = CoarseFeed::new();

        feed.add("a".to_string(), 3.0);
        feed.add("b".to_string(), 1.0);
        feed.add("c".to_string(), 2.0);

        let timestamps: Vec<f64> = feed.snapshot().iter().map(|p| p.timestamp).collect();
        assert_eq!(timestamps, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_remove_head_then_middle() {
        let feed: CoarseFeed<SimpleRwLock> = CoarseFeed::new();

        for (body, ts) in [("a", 3.0), ("b", 2.0), ("c", 1.0)] {
            feed.add(body.to_string(), ts);
        }

        assert!(feed.remove(3.0));
        assert!(feed.remove(1.0));
        assert!(!feed.remove(9.0));

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].body, "b");
    }
}
