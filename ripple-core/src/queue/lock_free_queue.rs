use std::mem::MaybeUninit;
use std::sync::atomic::Ordering;

use crossbeam_epoch::{self as epoch, Atomic, Owned, Shared};

// Michael & Scott's lock-free FIFO queue, 'Simple, Fast, and Practical
// Non-Blocking and Blocking Concurrent Queue Algorithms'.
//
// INVARIANTS:
// 1. `head` always points at a dummy node; the front element is head.next
// 2. `tail` is the true tail or lags it by exactly one node
// 3. A node's `next` is written once by the CAS that links it in
//
// MEMORY RECLAMATION:
// ===================
// The classical algorithm is vulnerable to a stalled thread CASing with a
// stale pointer whose node was freed and reallocated. Reclamation goes
// through crossbeam-epoch: a superseded dummy is retired with
// `defer_destroy` and only freed once every thread pinned at the time has
// moved on, so an address a thread can still name is never recycled.
//
struct QueueNode<T> {
    // The dummy's slot is vacant; a dequeued slot has been read out and is
    // vacant again by the time the node is retired.
    payload: MaybeUninit<T>,
    next: Atomic<QueueNode<T>>,
}

impl<T> QueueNode<T> {
    fn vacant() -> Self {
        QueueNode {
            payload: MaybeUninit::uninit(),
            next: Atomic::null(),
        }
    }

    fn occupied(value: T) -> Self {
        QueueNode {
            payload: MaybeUninit::new(value),
            next: Atomic::null(),
        }
    }
}

/// Lock-free FIFO queue for request hand-off.
///
/// Safe under any number of concurrent enqueuers and dequeuers. Neither
/// operation ever blocks; both spin with bounded per-retry work, and a
/// thread that observes another thread's half-finished tail update helps
/// complete it instead of waiting.
///
/// Progress is lock-free, not wait-free: some thread always completes,
/// but an individual thread can be forced to retry arbitrarily.
pub struct LockFreeQueue<T> {
    head: Atomic<QueueNode<T>>,
    tail: Atomic<QueueNode<T>>,
}

// Safety: payloads move between threads through the queue; nodes are only
// mutated via the atomics and freed through the epoch collector.
unsafe impl<T: Send> Send for LockFreeQueue<T> {}
unsafe impl<T: Send> Sync for LockFreeQueue<T> {}

impl<T> LockFreeQueue<T> {
    pub fn new() -> Self {
        // head and tail both start at a shared dummy node.
        let dummy = Owned::new(QueueNode::vacant()).into_shared(unsafe { epoch::unprotected() });
        LockFreeQueue {
            head: Atomic::from(dummy),
            tail: Atomic::from(dummy),
        }
    }

    /// Append a value at the tail.
    pub fn enqueue(&self, value: T) {
        let guard = &epoch::pin();
        let new_node = Owned::new(QueueNode::occupied(value)).into_shared(guard);

        loop {
            let tail = self.tail.load(Ordering::Acquire, guard);
            let tail_ref = unsafe { tail.deref() };
            let next = tail_ref.next.load(Ordering::Acquire, guard);

            if next.is_null() {
                // The snapshot looks like the true tail; try to link in.
                if tail_ref
                    .next
                    .compare_exchange(
                        Shared::null(),
                        new_node,
                        Ordering::Release,
                        Ordering::Relaxed,
                        guard,
                    )
                    .is_ok()
                {
                    // Linked. Swinging the tail may fail; a helper will
                    // finish the job.
                    let _ = self.tail.compare_exchange(
                        tail,
                        new_node,
                        Ordering::Release,
                        Ordering::Relaxed,
                        guard,
                    );
                    return;
                }
            } else {
                // The tail is lagging behind a completed link; help it
                // forward and retry.
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
            }
        }
    }

    /// Remove and return the value at the front, or `None` if the queue is
    /// empty at some point during the call.
    pub fn dequeue(&self) -> Option<T> {
        let guard = &epoch::pin();

        loop {
            let head = self.head.load(Ordering::Acquire, guard);
            let tail = self.tail.load(Ordering::Acquire, guard);
            let head_ref = unsafe { head.deref() };
            let next = head_ref.next.load(Ordering::Acquire, guard);

            if head == tail {
                if next.is_null() {
                    // Empty at this snapshot.
                    return None;
                }
                // Non-empty but the tail is lagging; help before retrying.
                let _ = self.tail.compare_exchange(
                    tail,
                    next,
                    Ordering::Release,
                    Ordering::Relaxed,
                    guard,
                );
            } else {
                // head != tail means at least one element: the chain from
                // head to tail is non-empty, and a superseded head keeps
                // its next pointer, so `next` cannot be null here.
                debug_assert!(!next.is_null());
                let next_ref = unsafe { next.deref() };

                if self
                    .head
                    .compare_exchange(
                        head,
                        next,
                        Ordering::Release,
                        Ordering::Relaxed,
                        guard,
                    )
                    .is_ok()
                {
                    // We won the swing: `next` is the new dummy and its
                    // payload is ours alone to take. The enqueuer's
                    // Release CAS published it before `next` became
                    // reachable, and our Acquire load of head.next pairs
                    // with that.
                    let payload = unsafe { next_ref.payload.assume_init_read() };

                    // Retire the superseded dummy.
                    unsafe { guard.defer_destroy(head) };

                    return Some(payload);
                }
            }
        }
    }
}

impl<T> Default for LockFreeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for LockFreeQueue<T> {
    fn drop(&mut self) {
        // Exclusive access: walk the chain directly. The node at head is
        // the dummy and carries no payload; everything after it does.
        unsafe {
            let guard = epoch::unprotected();

            let head = self.head.load(Ordering::Relaxed, guard);
            let mut cur = head.deref().next.load(Ordering::Relaxed, guard);
            drop(head.into_owned());

            while !cur.is_null() {
                let next = cur.deref().next.load(Ordering::Relaxed, guard);
                let mut node = cur.into_owned();
                node.payload.assume_init_drop();
                drop(node);
                cur = next;
            }
        }
    }
}
