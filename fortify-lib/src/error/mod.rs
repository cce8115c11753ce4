//! Error types

mod api;
mod auth;
mod protocol;

pub use api::*;
pub use auth::*;
pub use protocol::*;

use std::time::Duration;

/// Top-level error returned by every client operation.
///
/// None of these are retried by the query layer; retry policy belongs to the
/// transport ([`crate::transport::RetryConfig`]) or to the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure, propagated unmodified.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Obtaining or refreshing the access token failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The response did not have the expected `count`/`data` envelope.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A unique lookup matched more than one record.
    #[error("Expected at most one record, found {found}")]
    Cardinality {
        /// Number of records observed.
        found: usize,
    },

    /// Invalid caller-supplied configuration, detected before any request.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The operation is not available.
    #[error("{0} is not supported")]
    Unsupported(&'static str),

    /// The server kept answering 429 after all retries were used.
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimit {
        /// Value of the last `Retry-After` header, if any.
        retry_after: Option<Duration>,
    },
}

impl Error {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(api) => api.status_code(),
            Self::Auth(AuthError::Endpoint(api)) => api.status_code(),
            _ => None,
        }
    }
}
