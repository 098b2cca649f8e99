//! Error types surfaced by the library.
//!
//! Per-server failures never show up here: the failover loop folds them into
//! [`crate::OperationResult`] or an absent value. These errors only cover
//! building a session and parsing addresses, plus the transport contract.

/// Errors returned while setting up a session.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `host:port` string could not be parsed.
    #[error("invalid server address '{input}': {reason}")]
    InvalidAddress { input: String, reason: &'static str },

    /// The shared HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// A request that never produced a response body.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client reported a failure (connect, DNS, timeout, body read).
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failure reported by a custom [`crate::transport::Transport`].
    #[error("transport failure: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
