//! Main FortifyClient

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::api::ApplicationVersionsQuery;
use crate::api::CustomTagApi;
use crate::api::CustomTagsQuery;
use crate::api::IssuesQuery;
use crate::api::MetricHistoriesQuery;
use crate::api::MetricType;
use crate::api::ReleasesQuery;
use crate::api::query::DEFAULT_PAGE_SIZE;
use crate::api::query::EntityQueryBuilder;
use crate::auth::Credentials;
use crate::auth::DEFAULT_TOKEN_PATH;
use crate::auth::TokenFactory;
use crate::auth::TokenProvider;
use crate::config::ConnectionConfig;
use crate::error::Error;
use crate::transport::AuthenticatingConnection;
use crate::transport::HttpConnection;
use crate::transport::RestConnection;
use crate::transport::RetryConfig;

/// Entry point for talking to a server.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across tasks. All clones share one token and one set of caches.
///
/// # Example
///
/// ```ignore
/// use fortify_lib::FortifyClient;
/// use fortify_lib::auth::Credentials;
///
/// let client = FortifyClient::builder()
///     .url("https://ssc.example.com/ssc")
///     .credentials(Credentials::password("jdoe", "secret"))
///     .build()?;
///
/// let versions = client
///     .application_versions()
///     .application_name("WebGoat")
///     .get_all()
///     .await?;
/// ```
#[derive(Clone)]
pub struct FortifyClient {
    inner: Arc<FortifyClientInner>,
}

struct FortifyClientInner {
    connection: Arc<dyn RestConnection>,
    token_provider: Arc<dyn TokenProvider>,
    custom_tags: CustomTagApi,
    page_size: usize,
}

impl FortifyClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> FortifyClientBuilder<Missing, Missing> {
        FortifyClientBuilder::new()
    }

    /// Builds a client from a [`ConnectionConfig`].
    pub fn from_config(config: &ConnectionConfig) -> Result<Self, Error> {
        let mut builder = Self::builder()
            .url(config.url.clone())
            .credentials(config.credentials.clone())
            .token_path(config.token_path.clone())
            .retry_config(config.retry.clone())
            .page_size(config.page_size);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        builder.build()
    }

    /// Creates a client on top of an existing transport.
    ///
    /// Every request sent through `transport` carries a bearer token from
    /// `token_provider`.
    pub fn from_transport<C>(transport: C, token_provider: Arc<dyn TokenProvider>) -> Self
    where
        C: RestConnection + 'static,
    {
        Self::assemble(transport, token_provider, DEFAULT_PAGE_SIZE)
    }

    fn assemble<C>(transport: C, token_provider: Arc<dyn TokenProvider>, page_size: usize) -> Self
    where
        C: RestConnection + 'static,
    {
        let connection: Arc<dyn RestConnection> =
            Arc::new(AuthenticatingConnection::new(transport, token_provider.clone()));
        Self {
            inner: Arc::new(FortifyClientInner {
                custom_tags: CustomTagApi::new(connection.clone()),
                connection,
                token_provider,
                page_size,
            }),
        }
    }

    /// Returns the authenticated connection.
    pub fn connection(&self) -> Arc<dyn RestConnection> {
        self.inner.connection.clone()
    }

    /// Returns the page size used by queries created from this client.
    pub fn page_size(&self) -> usize {
        self.inner.page_size
    }

    /// Returns a currently valid access token.
    pub async fn get_token(&self) -> Result<String, Error> {
        Ok(self.inner.token_provider.get_token().await?.access_token)
    }

    /// Starts a query against an arbitrary collection path.
    pub fn query(&self, path: impl Into<String>) -> EntityQueryBuilder {
        EntityQueryBuilder::new(self.connection(), path).page_size(self.inner.page_size)
    }

    /// Starts a query for application versions.
    pub fn application_versions(&self) -> ApplicationVersionsQuery {
        ApplicationVersionsQuery::new(self.connection()).page_size(self.inner.page_size)
    }

    /// Starts a query for Fortify on Demand releases.
    ///
    /// Only meaningful when the client is connected to a FoD API server.
    pub fn releases(&self) -> ReleasesQuery {
        ReleasesQuery::new(self.connection()).page_size(self.inner.page_size)
    }

    /// Starts a query for the issues of an application version.
    pub fn issues(&self, version_id: &str) -> IssuesQuery {
        IssuesQuery::new(self.connection(), version_id).page_size(self.inner.page_size)
    }

    /// Starts a query for the metric history of an application version.
    pub fn metric_histories(&self, version_id: &str, metric_type: MetricType) -> MetricHistoriesQuery {
        MetricHistoriesQuery::new(self.connection(), version_id, metric_type)
    }

    /// Starts a query for custom tag definitions.
    pub fn custom_tag_definitions(&self) -> CustomTagsQuery {
        CustomTagsQuery::all(self.connection())
    }

    /// Cached custom tag lookups and auditing.
    pub fn custom_tags(&self) -> &CustomTagApi {
        &self.inner.custom_tags
    }
}

impl std::fmt::Debug for FortifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FortifyClient")
            .field("base", &self.inner.connection.base_target().to_url())
            .field("page_size", &self.inner.page_size)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`FortifyClient`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `url` - The server base URL
/// - `credentials` - [`Credentials`] exchanged for access tokens
pub struct FortifyClientBuilder<Url, Creds> {
    url: Url,
    credentials: Creds,
    token_path: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    retry_config: RetryConfig,
    page_size: usize,
    http_client: Option<Client>,
}

impl FortifyClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            credentials: Missing,
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            timeout: None,
            connect_timeout: None,
            retry_config: RetryConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            http_client: None,
        }
    }
}

impl Default for FortifyClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> FortifyClientBuilder<Missing, C> {
    /// Sets the server base URL.
    pub fn url(self, url: impl Into<String>) -> FortifyClientBuilder<Set<String>, C> {
        FortifyClientBuilder {
            url: Set(url.into()),
            credentials: self.credentials,
            token_path: self.token_path,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            retry_config: self.retry_config,
            page_size: self.page_size,
            http_client: self.http_client,
        }
    }
}

impl<U> FortifyClientBuilder<U, Missing> {
    /// Sets the credentials.
    pub fn credentials(self, credentials: Credentials) -> FortifyClientBuilder<U, Set<Credentials>> {
        FortifyClientBuilder {
            url: self.url,
            credentials: Set(credentials),
            token_path: self.token_path,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            retry_config: self.retry_config,
            page_size: self.page_size,
            http_client: self.http_client,
        }
    }
}

impl<U, C> FortifyClientBuilder<U, C> {
    /// Sets the token endpoint path.
    ///
    /// Defaults to `/oauth/token`.
    pub fn token_path(mut self, token_path: impl Into<String>) -> Self {
        self.token_path = token_path.into();
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// Ignored when a custom HTTP client is set.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the transport retry policy.
    pub fn retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    /// Sets the page size for collection queries.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl FortifyClientBuilder<Set<String>, Set<Credentials>> {
    /// Builds the [`FortifyClient`].
    ///
    /// Fails if the URL cannot be parsed or the HTTP client cannot be created.
    pub fn build(self) -> Result<FortifyClient, Error> {
        let url = self.url.0;
        let mut transport = match (self.http_client, self.connect_timeout) {
            (Some(client), _) => HttpConnection::new(&url)?.with_http_client(client),
            (None, Some(timeout)) => HttpConnection::with_connect_timeout(&url, timeout)?,
            (None, None) => HttpConnection::new(&url)?,
        };
        if let Some(timeout) = self.timeout {
            transport = transport.with_timeout(timeout);
        }
        let transport = transport.with_retry_config(self.retry_config);

        let token_factory =
            TokenFactory::new(transport.clone(), self.credentials.0).with_token_path(self.token_path);

        Ok(FortifyClient::assemble(
            transport,
            Arc::new(token_factory),
            self.page_size,
        ))
    }
}
