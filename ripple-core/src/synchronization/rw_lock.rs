/// Maximum number of readers allowed inside the critical section at once.
pub const MAX_READERS: usize = 32;

/// A reader/writer lock with bounded reader parallelism and writer
/// preference.
///
/// Shared holders may coexist up to [`MAX_READERS`]; an exclusive holder is
/// mutually exclusive with everyone. A waiting writer takes priority over
/// newly arriving readers, so writers cannot starve behind a continuous
/// reader stream.
///
/// `Default` is required so data structures can be generic over the lock
/// type and construct one themselves.
///
/// # Contract
///
/// Acquire/release calls do not fail. Releasing a lock mode that is not
/// held is a programming error; implementations `debug_assert!` on it.
pub trait RwLock: Default + Send + Sync {
    /// Block until a shared (reader) slot is available, then take it.
    fn acquire_shared(&self);

    /// Give up a shared slot previously taken with `acquire_shared`.
    fn release_shared(&self);

    /// Block until the lock can be held exclusively, then take it.
    fn acquire_exclusive(&self);

    /// Give up exclusive ownership previously taken with
    /// `acquire_exclusive`.
    fn release_exclusive(&self);
}
