//! Authentication error types

use super::ApiError;

/// Errors that can occur while obtaining an access token.
///
/// A failed refresh never falls back to a previously issued token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token endpoint rejected the configured credentials.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The token endpoint call failed at the transport level.
    #[error("Token endpoint error: {0}")]
    Endpoint(#[from] ApiError),

    /// Failed to parse the token endpoint response.
    #[error("Auth response parse error: {0}")]
    Parse(String),
}
