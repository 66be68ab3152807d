//! Lock-free request hand-off between the producer and the worker pool.

pub mod lock_free_queue;

pub use lock_free_queue::LockFreeQueue;
