//! Error types for the query server binary.
//!
//! [`QuerydError`] is the top-level error type that wraps all possible
//! failure modes during startup, providing a single error type that `main`
//! can propagate with `?`.

/// Top-level error for the query server binary.
#[derive(Debug, thiserror::Error)]
pub enum QuerydError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// The HTTP server failed to start or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: chronicle_query::ServerError,
    },
}
