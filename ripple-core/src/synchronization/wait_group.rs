use std::sync::{Condvar, Mutex};

/// Counter with a zero-wait.
///
/// The producer registers each accepted task with [`add`](WaitGroup::add)
/// before handing it off, workers call [`done`](WaitGroup::done) after
/// executing one, and the drain step blocks in [`wait`](WaitGroup::wait)
/// until every registered task has completed. Unlike a fixed-count latch
/// the total is not known up front; tasks are discovered as the input
/// stream is read.
pub struct WaitGroup {
    count: Mutex<usize>,
    condvar: Condvar,
}

impl WaitGroup {
    pub fn new() -> Self {
        WaitGroup {
            count: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }

    // Register `n` tasks that must complete before waiters are released.
    //
    pub fn add(&self, n: usize) {
        let mut count = self.count.lock().unwrap();
        *count += n;
    }

    // Mark one task as complete, releasing waiters when the count hits zero.
    //
    pub fn done(&self) {
        let mut count = self.count.lock().unwrap();
        debug_assert!(*count > 0, "done called more times than add");
        *count -= 1;
        if *count == 0 {
            self.condvar.notify_all();
        }
    }

    // Block until the count reaches zero. Returns immediately if nothing
    // is outstanding.
    //
    pub fn wait(&self) {
        let mut count = self.count.lock().unwrap();
        while *count > 0 {
            count = self.condvar.wait(count).unwrap();
        }
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}
