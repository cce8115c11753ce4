//! Connection decorator that authorizes every request.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::RestConnection;
use super::RestRequest;
use super::Target;
use crate::auth::TokenProvider;
use crate::error::Error;

/// Wraps a [`RestConnection`] and attaches `Authorization: Bearer <token>`
/// to every request.
///
/// The token is requested from the [`TokenProvider`] right before each
/// request, so an expired token is refreshed transparently.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use fortify_lib::auth::{Credentials, TokenFactory};
/// use fortify_lib::transport::{AuthenticatingConnection, HttpConnection};
///
/// let basic = HttpConnection::new("https://api.example.com")?;
/// let tokens = Arc::new(TokenFactory::new(basic.clone(), Credentials::client_credentials("id", "secret")));
/// let conn = AuthenticatingConnection::new(basic, tokens);
/// ```
#[derive(Clone)]
pub struct AuthenticatingConnection<C> {
    inner: C,
    token_provider: Arc<dyn TokenProvider>,
}

impl<C: RestConnection> AuthenticatingConnection<C> {
    /// Creates an authenticating connection.
    pub fn new(inner: C, token_provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            inner,
            token_provider,
        }
    }

    /// Returns the token provider used by this connection.
    pub fn token_provider(&self) -> &Arc<dyn TokenProvider> {
        &self.token_provider
    }

    /// Returns the wrapped connection.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: RestConnection> RestConnection for AuthenticatingConnection<C> {
    fn base_target(&self) -> Target {
        self.inner.base_target()
    }

    async fn execute(&self, request: RestRequest) -> Result<Value, Error> {
        let token = self.token_provider.get_token().await?;
        let request = request.with_header("Authorization", token.as_bearer());
        self.inner.execute(request).await
    }
}
