use thiserror::Error;

/// Errors crossing the server's component boundaries.
///
/// Feed operations themselves never fail; a `remove` or `contains` miss is
/// a normal result carried in the response's `success` field, not an
/// error.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The input stream is malformed or truncated. Terminates the run
    /// after in-flight work has drained.
    #[error("failed to decode request: {0}")]
    Decode(#[source] serde_json::Error),

    /// A response could not be serialized. Terminates the worker that hit
    /// it; other workers continue.
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),

    /// The output stream is closed or broken.
    #[error("output stream error: {0}")]
    Io(#[source] std::io::Error),
}
