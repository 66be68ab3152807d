use std::sync::{Condvar, Mutex};

use super::rw_lock::{MAX_READERS, RwLock};

#[derive(Default)]
struct State {
    // readers currently inside the critical section
    reading: usize,
    // readers queued because the reader cap was hit
    pending: usize,
    // readers the draining writer still has to wait out
    wait_for_readers: usize,
    // a writer is queued, draining existing readers
    writer_waiting: bool,
    // a writer holds the lock
    writer_writing: bool,
}

/// Three-condition-variable reader/writer lock.
///
/// Waiters are split by role so a state change only wakes the class of
/// threads that can actually use it:
///
/// - `readers` - readers blocked by writer preference or by the reader cap
/// - `writers` - writers queued behind the current writer
/// - `drain` - the single writer waiting out the readers that were active
///   or pending when it arrived
///
/// A writer that arrives while readers are active records how many it must
/// wait for (`wait_for_readers`); each reader that finishes either passes
/// the baton to a pending reader (those were in line before the writer and
/// may still run) or, as the last one out, releases the drained writer.
///
/// Readers that arrive after a writer releases but before the next queued
/// writer wakes will run ahead of that writer. This matches the policy of
/// the standard library's `RwLock` on most platforms and is the price of
/// not handing the lock over under the hood.
pub struct FastRwLock {
    state: Mutex<State>,
    readers: Condvar,
    writers: Condvar,
    drain: Condvar,
}

impl FastRwLock {
    pub fn new() -> Self {
        FastRwLock {
            state: Mutex::new(State::default()),
            readers: Condvar::new(),
            writers: Condvar::new(),
            drain: Condvar::new(),
        }
    }
}

impl Default for FastRwLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RwLock for FastRwLock {
    fn acquire_shared(&self) {
        let mut state = self.state.lock().unwrap();

        // Writer preference: a queued or active writer parks new readers.
        while state.writer_writing || state.writer_waiting {
            state = self.readers.wait(state).unwrap();
        }

        // Reader cap with an explicit queue length so a draining writer
        // knows how many readers were already in line.
        while state.reading >= MAX_READERS {
            state.pending += 1;
            state = self.readers.wait(state).unwrap();
            state.pending -= 1;
        }

        state.reading += 1;
    }

    fn release_shared(&self) {
        let mut state = self.state.lock().unwrap();

        debug_assert!(state.reading > 0, "release_shared without a holder");
        state.reading -= 1;

        // `readers` holds two classes of waiter: capacity-queued readers
        // and preference-parked ones. std's condvar does not promise FIFO
        // wakeups, so a targeted notify_one could land on a parked reader
        // that immediately re-sleeps and strand the queued one. Waking the
        // class is cheap here and every waiter re-checks its predicate.
        if !state.writer_waiting && state.pending > 0 {
            self.readers.notify_all();
        } else if state.wait_for_readers > 1 {
            // A writer is draining and this was not the last reader it
            // waits for; let a pending reader that predates the writer run.
            state.wait_for_readers -= 1;
            self.readers.notify_all();
        } else {
            // Last reader out releases the drained writer.
            self.drain.notify_one();
        }
    }

    fn acquire_exclusive(&self) {
        let mut state = self.state.lock().unwrap();

        // Writers are serialized: one queued writer at a time, the rest
        // line up behind `writers`.
        while state.writer_waiting || state.writer_writing {
            state = self.writers.wait(state).unwrap();
        }

        if state.reading > 0 || state.pending > 0 {
            state.writer_waiting = true;
            state.wait_for_readers = state.reading + state.pending;

            // Pending readers were in line before us and transition to
            // reading as the drain proceeds, so wait until both counts hit
            // zero rather than counting drain signals.
            while state.reading > 0 || state.pending > 0 {
                state = self.drain.wait(state).unwrap();
            }
        }

        state.writer_writing = true;
        state.writer_waiting = false;
    }

    fn release_exclusive(&self) {
        let mut state = self.state.lock().unwrap();

        debug_assert!(state.writer_writing, "release_exclusive without a holder");
        state.writer_writing = false;

        // All parked readers become eligible, then the next queued writer.
        self.readers.notify_all();
        self.writers.notify_one();
    }
}
