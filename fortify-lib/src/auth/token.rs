//! TokenProvider trait and AccessToken

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::error::AuthError;

/// Seconds subtracted from the server-reported lifetime of a token.
///
/// Covers clock skew and requests that are still in flight when the token
/// runs out.
pub const EXPIRY_MARGIN_SECS: i64 = 5;

/// An access token together with the instant it stops being used.
///
/// A token is replaced wholesale on refresh, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer token used for API authentication.
    pub access_token: String,
    /// When the token was obtained.
    pub issued_at: DateTime<Utc>,
    /// When the token must no longer be used, if known.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Creates a token without known expiry.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            issued_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Creates a token from a server-reported lifetime.
    ///
    /// `expires_at = issued_at + (expires_in - 5s)`, never earlier than
    /// `issued_at`.
    pub fn from_expires_in(
        access_token: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_in_secs: u64,
    ) -> Self {
        let lifetime = i64::try_from(expires_in_secs)
            .unwrap_or(i64::MAX / 1000)
            .saturating_sub(EXPIRY_MARGIN_SECS)
            .max(0);
        let expires_at = Duration::try_seconds(lifetime).and_then(|d| issued_at.checked_add_signed(d));
        Self {
            access_token: access_token.into(),
            issued_at,
            expires_at: Some(expires_at.unwrap_or(DateTime::<Utc>::MAX_UTC)),
        }
    }

    /// Returns `true` if the token may be used at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|exp| now < exp)
    }

    /// Returns `true` if the token has expired.
    ///
    /// Returns `false` if expiration time is unknown.
    pub fn is_expired(&self) -> bool {
        !self.is_valid_at(Utc::now())
    }

    /// Returns the token as a bearer authorization header value.
    pub fn as_bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Supplies access tokens to [`AuthenticatingConnection`](crate::transport::AuthenticatingConnection).
///
/// The connection calls `get_token` before each request. Implementations
/// return a cached token while it is valid and obtain a new one otherwise;
/// they must never hand out a token they know to be expired.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a token that was valid at the time of the call.
    async fn get_token(&self) -> Result<AccessToken, AuthError>;
}

/// A token provider that always returns the same static token.
///
/// Useful for testing or when a long-lived API token was issued out of band.
///
/// # Example
///
/// ```
/// use fortify_lib::auth::StaticTokenProvider;
///
/// let provider = StaticTokenProvider::new("my-access-token");
/// ```
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Creates a new static token provider with the given access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(access_token),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Result<AccessToken, AuthError> {
        Ok(self.token.clone())
    }
}
