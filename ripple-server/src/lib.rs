//! Request-processing server over a shared timestamp-sorted feed.
//!
//! A single producer decodes requests from an input stream and hands them
//! to a pool of worker threads through a lock-free queue; workers execute
//! them against the feed and write responses to a shared output stream.
//! The concurrency substrate lives in `ripple-core`; this crate carries
//! the wire protocol, the dispatcher and the producer/consumer runtime.

pub mod dispatch;
pub mod error;
pub mod protocol;
pub mod runtime;

pub use error::ServerError;
pub use protocol::{Command, FeedResponse, Request, Response, ResponseWriter};
pub use runtime::{ServerConfig, run};
