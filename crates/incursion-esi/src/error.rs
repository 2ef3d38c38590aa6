//! Error types for the feed client.
//!
//! Any [`FeedError`] from the incursion list aborts a reconciliation cycle;
//! one from a security lookup only affects the arrival being classified.

/// Errors that can occur while talking to the feed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// The HTTP client could not be built from the configuration.
    #[error("feed client config error: {0}")]
    Config(String),

    /// The request did not complete (connect, timeout, body read).
    #[error("feed request to {url} failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Underlying failure.
        message: String,
    },

    /// The feed answered with a non-success status.
    #[error("feed returned {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body was not the expected JSON shape.
    #[error("feed response from {url} could not be decoded: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Decoder message.
        message: String,
    },
}
