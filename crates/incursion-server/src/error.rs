//! Error types for the server binary.

/// Top-level error for the server binary.
///
/// Each variant wraps one subsystem's error so `main` can propagate with
/// `?`.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: incursion_core::ConfigError,
    },

    /// The store could not be opened.
    #[error("startup error: {source}")]
    Core {
        /// The underlying core error.
        #[from]
        source: incursion_core::CoreError,
    },

    /// The feed client could not be built.
    #[error("feed error: {source}")]
    Feed {
        /// The underlying feed error.
        #[from]
        source: incursion_esi::FeedError,
    },

    /// The read API failed to start.
    #[error("API error: {source}")]
    Api {
        /// The underlying startup error.
        #[from]
        source: incursion_api::StartupError,
    },

    /// Waiting for Ctrl-C failed.
    #[error("signal error: {source}")]
    Signal {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A background task panicked or was cancelled.
    #[error("task error: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },
}
