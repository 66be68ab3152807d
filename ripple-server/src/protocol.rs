//! Wire format: newline-separated JSON records on both streams.
//!
//! Requests are self-contained key-value documents; a streaming decoder
//! reads one at a time. Responses for different requests may be
//! interleaved in any order in parallel mode, correlated by `id`.

use std::io::Write;
use std::sync::Mutex;

use ripple_core::Post;
use serde::{Deserialize, Serialize};

use crate::error::ServerError;

/// The operations a client can request.
///
/// `Done` never reaches the dispatcher; the producer consumes it as the
/// shutdown signal. Anything unrecognized decodes to `Unknown` and is
/// dropped without a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Command {
    Add,
    Remove,
    Contains,
    Feed,
    Done,
    #[serde(other)]
    Unknown,
}

/// A client request.
///
/// `id` is an opaque correlation token chosen by the client. `body` is
/// only meaningful for `ADD`, `timestamp` for `ADD`/`REMOVE`/`CONTAINS`;
/// absent fields decode to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub timestamp: f64,
}

/// Response to `ADD`, `REMOVE` and `CONTAINS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub id: i64,
}

/// Response to `FEED`: the whole feed, head to tail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedResponse {
    pub id: i64,
    pub feed: Vec<Post>,
}

/// Serializing encoder over a shared output stream.
///
/// Workers write concurrently; the internal mutex keeps records whole on
/// the wire. Each record is terminated by a newline.
pub struct ResponseWriter<W: Write> {
    inner: Mutex<W>,
}

impl<W: Write> ResponseWriter<W> {
    pub fn new(writer: W) -> Self {
        ResponseWriter {
            inner: Mutex::new(writer),
        }
    }

    /// Encode one response record.
    pub fn write<T: Serialize>(&self, response: &T) -> Result<(), ServerError> {
        let mut writer = self.inner.lock().unwrap();
        serde_json::to_writer(&mut *writer, response).map_err(ServerError::Encode)?;
        writer.write_all(b"\n").map_err(ServerError::Io)?;
        Ok(())
    }

    /// Recover the underlying stream.
    pub fn into_inner(self) -> W {
        self.inner.into_inner().unwrap()
    }
}
