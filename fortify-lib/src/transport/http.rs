//! reqwest-backed connection with timeouts and retry.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use log::warn;
use reqwest::Client;
use serde_json::Value;

use super::RequestBody;
use super::RestConnection;
use super::RestRequest;
use super::RetryConfig;
use super::Target;
use crate::auth::mask_secrets;
use crate::error::ApiError;
use crate::error::Error;

/// Unauthenticated HTTP connection to a single server.
///
/// Owns the retry policy: failures for which [`ApiError::is_retryable`]
/// holds are retried according to its [`RetryConfig`]. Nothing above the transport
/// retries.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use fortify_lib::transport::{HttpConnection, RetryConfig};
///
/// let conn = HttpConnection::new("https://ssc.example.com/ssc")?
///     .with_timeout(Duration::from_secs(30))
///     .with_retry_config(RetryConfig::no_retry());
/// ```
#[derive(Debug, Clone)]
pub struct HttpConnection {
    base: Target,
    http_client: Client,
    timeout: Option<Duration>,
    retry_config: RetryConfig,
}

impl HttpConnection {
    /// Creates a connection for the given base URL with a default HTTP client.
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            base: Target::parse(base_url)?,
            http_client: Client::new(),
            timeout: None,
            retry_config: RetryConfig::default(),
        })
    }

    /// Creates a connection whose HTTP client uses the given connect timeout.
    pub fn with_connect_timeout(base_url: &str, connect_timeout: Duration) -> Result<Self, Error> {
        let http_client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(ApiError::from)?;
        Ok(Self::new(base_url)?.with_http_client(http_client))
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry policy.
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Sets a custom HTTP client.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http_client = client;
        self
    }

    /// Returns the retry policy.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    async fn send_once(&self, request: &RestRequest, url: &str) -> Result<reqwest::Response, ApiError> {
        let mut builder = self
            .http_client
            .request(request.method.clone(), url)
            .header("Accept", "application/json");

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match &request.body {
            Some(RequestBody::Form(form)) => builder.form(form),
            Some(RequestBody::Json(json)) => builder.json(json),
            None => builder,
        };

        builder.send().await.map_err(|e| match self.timeout {
            Some(timeout) if e.is_timeout() => ApiError::Timeout(timeout),
            _ => ApiError::Network(e),
        })
    }
}

#[async_trait]
impl RestConnection for HttpConnection {
    fn base_target(&self) -> Target {
        self.base.clone()
    }

    async fn execute(&self, request: RestRequest) -> Result<Value, Error> {
        let url = request.target.to_url();
        let retry = &self.retry_config;
        let mut attempts = 0;

        loop {
            let failure = match self.send_once(&request, &url).await {
                Ok(response) => {
                    let status = response.status();
                    let error = ApiError::http(status.as_u16(), status.to_string());

                    if error.is_rate_limited() {
                        let retry_after = parse_retry_after(&response);
                        if !retry.retry_on_429 || !retry.can_retry(attempts) {
                            return Err(Error::RateLimit { retry_after });
                        }
                        let wait = retry_after.unwrap_or_else(|| retry.delay_for(attempts));
                        warn!("{} {} rate limited, retrying in {:?}", request.method, url, wait);
                        tokio::time::sleep(wait).await;
                        attempts += 1;
                        continue;
                    }

                    if !(error.is_retryable() && retry.retry_on_5xx && retry.can_retry(attempts)) {
                        return read_json(response).await;
                    }
                    error
                }
                Err(error) => {
                    if !(error.is_retryable() && retry.retry_on_network && retry.can_retry(attempts)) {
                        return Err(Error::Api(error));
                    }
                    error
                }
            };

            let wait = retry.delay_for(attempts);
            warn!("{} {} failed ({}), retrying in {:?}", request.method, url, failure, wait);
            tokio::time::sleep(wait).await;
            attempts += 1;
        }
    }
}

/// Turns a response into JSON, mapping non-success statuses to [`ApiError::Http`].
async fn read_json(response: reqwest::Response) -> Result<Value, Error> {
    let status = response.status();
    let body = response.text().await.map_err(ApiError::from)?;

    if !status.is_success() {
        debug!("Error response body: {}", mask_secrets(&body));
        return Err(Error::Api(ApiError::http(status.as_u16(), body)));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&body)
        .map_err(|e| Error::Api(ApiError::parse_with_body(format!("Invalid JSON: {}", e), body)))
}

/// Parses the Retry-After header value (seconds).
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("Retry-After")?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
