pub mod common_tests;
pub mod feed;
pub mod queue;
pub mod synchronization;

// Re-export the types callers wire together for convenience
pub use feed::{CoarseFeed, Feed, OptimisticFeed, Post};
pub use queue::LockFreeQueue;
pub use synchronization::{FastRwLock, MAX_READERS, RwLock, SimpleRwLock, WaitGroup};
