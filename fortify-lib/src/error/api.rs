//! Transport error types

use std::time::Duration;

/// A request that did not produce a usable JSON body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-success status from the server.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        /// Response body, or the reason phrase when the body is empty.
        message: String,
    },

    /// Connection, TLS or protocol failure below HTTP.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// The base URL or a resolved on-demand URI is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The body is not JSON.
    #[error("Response parse error: {message}")]
    Parse {
        message: String,
        /// Raw body, kept for diagnostics.
        body: Option<String>,
    },
}

impl ApiError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Creates a parse error carrying the body that failed to parse.
    pub fn parse_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for failures that [`HttpConnection`] may retry.
    ///
    /// These are 429, the transient 5xx statuses (500, 502, 503, 504),
    /// network errors and timeouts. Whether a retry actually happens is
    /// decided by the connection's [`RetryConfig`].
    ///
    /// [`HttpConnection`]: crate::transport::HttpConnection
    /// [`RetryConfig`]: crate::transport::RetryConfig
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Network(_) | Self::Timeout(_) => true,
            Self::InvalidUrl(_) | Self::Parse { .. } => false,
        }
    }

    /// Returns `true` if this is a rate-limit response.
    pub fn is_rate_limited(&self) -> bool {
        self.status_code() == Some(429)
    }
}
