//! Token factory for the OAuth token endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use log::debug;
use log::info;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::AccessToken;
use super::Credentials;
use super::TokenProvider;
use super::mask_secrets;
use crate::error::ApiError;
use crate::error::AuthError;
use crate::error::Error;
use crate::transport::RestConnection;
use crate::transport::RestRequest;

/// Path of the token endpoint, relative to the connection base URL.
pub const DEFAULT_TOKEN_PATH: &str = "/oauth/token";

/// Source of the current time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Obtains and caches an access token, refreshing it shortly before expiry.
///
/// The token moves through `none -> valid -> expired -> valid -> ...`. The
/// `valid -> expired` transition is purely time based and is checked on
/// every [`get_token`](TokenProvider::get_token) call; there is no
/// background timer. A refresh happens under a write lock, so at most one
/// refresh request is in flight per factory and concurrent callers receive
/// the refreshed token.
///
/// The factory talks to the token endpoint through an unauthenticated
/// connection.
///
/// # Example
///
/// ```ignore
/// use fortify_lib::auth::{Credentials, TokenFactory};
/// use fortify_lib::transport::HttpConnection;
///
/// let conn = HttpConnection::new("https://api.example.com")?;
/// let factory = TokenFactory::new(conn, Credentials::password("jdoe", "secret").with_tenant("acme"));
/// let token = factory.token().await?;
/// ```
pub struct TokenFactory<C> {
    connection: C,
    credentials: Credentials,
    token_path: String,
    token: RwLock<Option<AccessToken>>,
    clock: Clock,
}

impl<C: RestConnection> TokenFactory<C> {
    /// Creates a factory posting `credentials` to [`DEFAULT_TOKEN_PATH`].
    pub fn new(connection: C, credentials: Credentials) -> Self {
        Self {
            connection,
            credentials,
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            token: RwLock::new(None),
            clock: Arc::new(Utc::now),
        }
    }

    /// Sets the token endpoint path.
    pub fn with_token_path(mut self, token_path: impl Into<String>) -> Self {
        self.token_path = token_path.into();
        self
    }

    /// Replaces the clock used to stamp and validate tokens.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the access token string, refreshing it first if needed.
    pub async fn token(&self) -> Result<String, AuthError> {
        Ok(self.get_token().await?.access_token)
    }

    /// Drops the cached token, forcing a refresh on next use.
    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    async fn request_token(&self) -> Result<AccessToken, AuthError> {
        let target = self.connection.base_target().path(&self.token_path);
        let form = self.credentials.to_form();

        if log::log_enabled!(log::Level::Debug) {
            let encoded: Vec<_> = form
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect();
            debug!("Requesting access token: POST {} {}", target, mask_secrets(&encoded.join("&")));
        }

        let issued_at = (self.clock)();
        let response = self
            .connection
            .execute(RestRequest::post_form(target, form))
            .await
            .map_err(map_endpoint_error)?;

        debug!("Token response: {}", mask_secrets(&response.to_string()));

        let token: TokenResponse =
            serde_json::from_value(response).map_err(|e| AuthError::Parse(e.to_string()))?;
        let expires_in = token
            .expires_in
            .ok_or_else(|| AuthError::Parse("token response lacks 'expires_in'".to_string()))?;

        let token = AccessToken::from_expires_in(token.access_token, issued_at, expires_in);
        if let Some(expires_at) = token.expires_at {
            info!("Obtained access token, expiring at {}", expires_at);
        }
        Ok(token)
    }
}

#[async_trait]
impl<C: RestConnection> TokenProvider for TokenFactory<C> {
    async fn get_token(&self) -> Result<AccessToken, AuthError> {
        // Fast path: cached token still valid
        {
            let guard = self.token.read().await;
            if let Some(ref token) = *guard {
                if token.is_valid_at((self.clock)()) {
                    return Ok(token.clone());
                }
            }
        }

        let mut guard = self.token.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(ref token) = *guard {
            if token.is_valid_at((self.clock)()) {
                return Ok(token.clone());
            }
        }

        // Drop the stale token before refreshing so a failure leaves nothing behind
        *guard = None;
        let token = self.request_token().await?;
        *guard = Some(token.clone());
        Ok(token)
    }
}

impl<C> std::fmt::Debug for TokenFactory<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenFactory")
            .field("credentials", &self.credentials)
            .field("token_path", &self.token_path)
            .finish_non_exhaustive()
    }
}

fn map_endpoint_error(error: Error) -> AuthError {
    match error {
        Error::Api(ApiError::Http { status: 400 | 401, .. }) => AuthError::InvalidCredentials,
        Error::Api(api) => AuthError::Endpoint(api),
        Error::Auth(auth) => auth,
        Error::RateLimit { .. } => AuthError::Endpoint(ApiError::http(429, "rate limited")),
        other => AuthError::Parse(other.to_string()),
    }
}

/// Token endpoint response. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default, deserialize_with = "deserialize_expires_in")]
    expires_in: Option<u64>,
}

/// Deserializes `expires_in` which can be either a number or a string.
fn deserialize_expires_in<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    match Option::<StringOrNumber>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrNumber::Number(n)) => Ok(Some(n)),
        Some(StringOrNumber::String(s)) => s
            .parse::<u64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid expires_in value: {}", s))),
    }
}
