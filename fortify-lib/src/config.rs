//! Connection configuration

use std::time::Duration;

use crate::api::query::DEFAULT_PAGE_SIZE;
use crate::auth::Credentials;
use crate::auth::DEFAULT_TOKEN_PATH;
use crate::error::Error;
use crate::transport::RetryConfig;

/// Everything needed to connect to a server.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use fortify_lib::auth::Credentials;
/// use fortify_lib::config::ConnectionConfig;
///
/// let config = ConnectionConfig::new(
///     "https://api.ams.fortify.com",
///     Credentials::client_credentials("key", "secret"),
/// )
/// .with_timeout(Duration::from_secs(60))
/// .with_page_size(100);
/// assert_eq!(config.page_size, 100);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Base URL of the server.
    pub url: String,

    /// Credentials exchanged for access tokens.
    pub credentials: Credentials,

    /// Token endpoint path.
    ///
    /// Default: `/oauth/token`
    pub token_path: String,

    /// Per-request timeout.
    pub timeout: Option<Duration>,

    /// TCP connect timeout.
    pub connect_timeout: Option<Duration>,

    /// Transport retry policy.
    pub retry: RetryConfig,

    /// Page size for collection queries.
    ///
    /// Default: 50
    pub page_size: usize,
}

impl ConnectionConfig {
    /// Creates a config with default settings.
    pub fn new(url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            url: url.into(),
            credentials,
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            timeout: None,
            connect_timeout: None,
            retry: RetryConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the token endpoint path.
    pub fn with_token_path(mut self, token_path: impl Into<String>) -> Self {
        self.token_path = token_path.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Reads the configuration from `FORTIFY_*` environment variables.
    ///
    /// - `FORTIFY_URL` (required)
    /// - `FORTIFY_CLIENT_ID` + `FORTIFY_CLIENT_SECRET`, or
    ///   `FORTIFY_USERNAME` + `FORTIFY_PASSWORD` with optional `FORTIFY_TENANT`
    /// - `FORTIFY_SCOPE`, `FORTIFY_TOKEN_PATH`, `FORTIFY_TIMEOUT_SECS`,
    ///   `FORTIFY_PAGE_SIZE` (optional)
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| Error::configuration(format!("{} is not set", name)))
        };

        let url = required("FORTIFY_URL")?;

        let credentials = if var("FORTIFY_CLIENT_ID").is_some() {
            Credentials::client_credentials(required("FORTIFY_CLIENT_ID")?, required("FORTIFY_CLIENT_SECRET")?)
        } else if var("FORTIFY_USERNAME").is_some() {
            let credentials =
                Credentials::password(required("FORTIFY_USERNAME")?, required("FORTIFY_PASSWORD")?);
            match var("FORTIFY_TENANT") {
                Some(tenant) => credentials.with_tenant(tenant),
                None => credentials,
            }
        } else {
            return Err(Error::configuration(
                "either FORTIFY_CLIENT_ID or FORTIFY_USERNAME must be set",
            ));
        };

        let credentials = match var("FORTIFY_SCOPE") {
            Some(scope) => credentials.with_scope(scope),
            None => credentials,
        };

        let mut config = Self::new(url, credentials);

        if let Some(token_path) = var("FORTIFY_TOKEN_PATH") {
            config = config.with_token_path(token_path);
        }
        if let Some(timeout) = var("FORTIFY_TIMEOUT_SECS") {
            let secs = parse_number("FORTIFY_TIMEOUT_SECS", &timeout)?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(page_size) = var("FORTIFY_PAGE_SIZE") {
            config = config.with_page_size(parse_number("FORTIFY_PAGE_SIZE", &page_size)? as usize);
        }

        Ok(config)
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::configuration(format!("{} must be a number, got '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_password_credentials_with_tenant() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            ("FORTIFY_URL", "https://api.ams.fortify.com"),
            ("FORTIFY_USERNAME", "jdoe"),
            ("FORTIFY_PASSWORD", "secret"),
            ("FORTIFY_TENANT", "acme"),
            ("FORTIFY_PAGE_SIZE", "200"),
        ]))
        .unwrap();

        assert_eq!(config.url, "https://api.ams.fortify.com");
        assert_eq!(config.page_size, 200);
        assert_eq!(config.token_path, DEFAULT_TOKEN_PATH);
        assert_eq!(
            config.credentials,
            Credentials::password("jdoe", "secret").with_tenant("acme")
        );
    }

    #[test]
    fn test_client_credentials_take_precedence() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            ("FORTIFY_URL", "https://api.ams.fortify.com"),
            ("FORTIFY_CLIENT_ID", "key"),
            ("FORTIFY_CLIENT_SECRET", "secret"),
            ("FORTIFY_USERNAME", "ignored"),
            ("FORTIFY_SCOPE", "view-apps"),
        ]))
        .unwrap();

        assert_eq!(
            config.credentials,
            Credentials::client_credentials("key", "secret").with_scope("view-apps")
        );
    }

    #[test]
    fn test_missing_values() {
        let err = ConnectionConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("FORTIFY_URL")));

        let err = ConnectionConfig::from_lookup(lookup(&[("FORTIFY_URL", "https://x")])).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let err = ConnectionConfig::from_lookup(lookup(&[
            ("FORTIFY_URL", "https://x"),
            ("FORTIFY_CLIENT_ID", "key"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(ref m) if m.contains("FORTIFY_CLIENT_SECRET")));
    }

    #[test]
    fn test_invalid_number() {
        let err = ConnectionConfig::from_lookup(lookup(&[
            ("FORTIFY_URL", "https://x"),
            ("FORTIFY_CLIENT_ID", "key"),
            ("FORTIFY_CLIENT_SECRET", "secret"),
            ("FORTIFY_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
