//! Transport capability
//!
//! Everything above this module talks to the server through the
//! [`RestConnection`] trait: one request in, one parsed JSON document out.
//! Connection pooling, TLS, timeouts and retries live behind it.
//!
//! - [`HttpConnection`] - plain reqwest-backed connection
//! - [`AuthenticatingConnection`] - adds a bearer token to every request
//! - [`Target`] - request URL with ordered query parameters

mod authenticating;
mod http;
mod retry;
mod target;

pub use authenticating::AuthenticatingConnection;
pub use http::HttpConnection;
pub use reqwest::Method;
pub use retry::RetryConfig;
pub use target::Target;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Error;

/// Body of an outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` key/value pairs.
    Form(Vec<(String, String)>),
    /// JSON document.
    Json(Value),
}

/// A single request against a [`RestConnection`].
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    /// HTTP method.
    pub method: Method,
    /// Fully decorated request target.
    pub target: Target,
    /// Additional request headers.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<RequestBody>,
}

impl RestRequest {
    /// Creates a request without body.
    pub fn new(method: Method, target: Target) -> Self {
        Self {
            method,
            target,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a GET request.
    pub fn get(target: Target) -> Self {
        Self::new(Method::GET, target)
    }

    /// Creates a POST request with a form-encoded body.
    pub fn post_form(target: Target, form: Vec<(String, String)>) -> Self {
        Self {
            body: Some(RequestBody::Form(form)),
            ..Self::new(Method::POST, target)
        }
    }

    /// Creates a POST request with a JSON body.
    pub fn post_json(target: Target, body: Value) -> Self {
        Self {
            body: Some(RequestBody::Json(body)),
            ..Self::new(Method::POST, target)
        }
    }

    /// Adds a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the first value of the given header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The injected transport capability.
///
/// Implementations perform one HTTP request against a fully qualified
/// target and return the parsed JSON body (`Value::Null` when the body is
/// empty). Transport failures are returned as [`Error::Api`].
///
/// # Example
///
/// ```ignore
/// use fortify_lib::transport::{HttpConnection, RestConnection, RestRequest};
///
/// let conn = HttpConnection::new("https://ssc.example.com/ssc")?;
/// let target = conn.base_target().path("api/v1/projects");
/// let json = conn.execute(RestRequest::get(target)).await?;
/// ```
#[async_trait]
pub trait RestConnection: Send + Sync {
    /// Returns the base target all resource paths are resolved against.
    fn base_target(&self) -> Target;

    /// Performs the request and returns the parsed JSON response.
    async fn execute(&self, request: RestRequest) -> Result<Value, Error>;
}

#[async_trait]
impl<T: RestConnection + ?Sized> RestConnection for Arc<T> {
    fn base_target(&self) -> Target {
        (**self).base_target()
    }

    async fn execute(&self, request: RestRequest) -> Result<Value, Error> {
        (**self).execute(request).await
    }
}
