use std::sync::{Condvar, Mutex};

use super::rw_lock::{MAX_READERS, RwLock};

// All bookkeeping lives behind one mutex; every state change that can
// unblock a waiter broadcasts the single condition variable and waiters
// re-check their predicate.
#[derive(Default)]
struct State {
    // readers currently inside the critical section
    reader_count: usize,
    // writers waiting plus the active one
    writer_count: usize,
    // a writer holds the lock
    writer_active: bool,
}

/// Single-condition-variable reader/writer lock.
///
/// The straightforward variant: one mutex, one condition variable shared by
/// readers and writers. Writer preference comes from readers gating on
/// `writer_count > 0`, which counts waiting writers, not only the active
/// one. Simpler than [`FastRwLock`](super::FastRwLock) at the cost of
/// broadcast wakeups that mostly go back to sleep.
pub struct SimpleRwLock {
    state: Mutex<State>,
    condvar: Condvar,
}

impl SimpleRwLock {
    pub fn new() -> Self {
        SimpleRwLock {
            state: Mutex::new(State::default()),
            condvar: Condvar::new(),
        }
    }
}

impl Default for SimpleRwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RwLock for SimpleRwLock {
    fn acquire_shared(&self) {
        let mut state = self.state.lock().unwrap();

        // A queued writer blocks new readers.
        while state.writer_count > 0 {
            state = self.condvar.wait(state).unwrap();
        }

        // Bounded reader parallelism: the cap is a hard 32.
        while state.reader_count >= MAX_READERS {
            state = self.condvar.wait(state).unwrap();
        }

        state.reader_count += 1;
    }

    fn release_shared(&self) {
        let mut state = self.state.lock().unwrap();

        debug_assert!(state.reader_count > 0, "release_shared without a holder");
        state.reader_count -= 1;

        // The last reader out wakes everyone; a queued writer or a
        // capacity-blocked reader re-checks and proceeds.
        if state.reader_count == 0 {
            self.condvar.notify_all();
        }
    }

    fn acquire_exclusive(&self) {
        let mut state = self.state.lock().unwrap();

        // Announce intent first so arriving readers queue behind us.
        state.writer_count += 1;

        while state.reader_count > 0 {
            state = self.condvar.wait(state).unwrap();
        }
        while state.writer_active {
            state = self.condvar.wait(state).unwrap();
        }

        state.writer_active = true;
    }

    fn release_exclusive(&self) {
        let mut state = self.state.lock().unwrap();

        debug_assert!(state.writer_active, "release_exclusive without a holder");
        state.writer_count -= 1;
        state.writer_active = false;

        self.condvar.notify_all();
    }
}
