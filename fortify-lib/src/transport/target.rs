//! Request target: base URL, path and ordered query parameters.

use url::Url;

use crate::error::ApiError;
use crate::error::Error;

/// A request target that is decorated step by step before dispatch.
///
/// Query parameters keep their insertion order. Parameter values are
/// percent-encoded when rendered, except for `+`, which is passed through
/// so that composed filter expressions such as `a:"x"+and+b:1` reach the
/// server as written.
///
/// # Example
///
/// ```
/// use fortify_lib::transport::Target;
///
/// let target = Target::parse("https://ssc.example.com/ssc")
///     .unwrap()
///     .path("api/v1/projectVersions")
///     .query_param("fields", "id,name");
///
/// assert_eq!(
///     target.to_url(),
///     "https://ssc.example.com/ssc/api/v1/projectVersions?fields=id%2Cname"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    base: String,
    path: String,
    params: Vec<(String, String)>,
}

impl Target {
    /// Creates a target for the given base URL.
    pub fn new(base: Url) -> Self {
        Self {
            base: base.as_str().trim_end_matches('/').to_string(),
            path: String::new(),
            params: Vec::new(),
        }
    }

    /// Parses a base URL into a target.
    pub fn parse(base: &str) -> Result<Self, Error> {
        let url = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base, e)))?;
        Ok(Self::new(url))
    }

    /// Appends one or more path segments (separated by `/`).
    ///
    /// Each segment is percent-encoded, so `?` and `#` stay part of the path.
    pub fn path(self, segments: &str) -> Self {
        segments
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self, |target, segment| target.segment(segment))
    }

    /// Appends a single path segment, percent-encoding `/` as well.
    pub fn segment(mut self, segment: &str) -> Self {
        self.path.push('/');
        self.path.push_str(&urlencoding::encode(segment));
        self
    }

    /// Appends a relative URI of the form `path[?name=value&...]`.
    ///
    /// Query values are taken literally (not decoded).
    pub fn relative(self, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };
        let mut target = self.path(path);
        for pair in query.into_iter().flat_map(|q| q.split('&')).filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            target = target.query_param(name, value);
        }
        target
    }

    /// Appends a query parameter, keeping any existing values of the same name.
    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Replaces all values of a query parameter.
    ///
    /// Passing `None` removes the parameter.
    pub fn replace_query_param(mut self, name: &str, value: Option<String>) -> Self {
        self.params.retain(|(n, _)| n != name);
        if let Some(value) = value {
            self.params.push((name.to_string(), value));
        }
        self
    }

    /// Returns the first value of the given query parameter.
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns all query parameters in insertion order.
    pub fn query_params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Returns the encoded path appended to the base URL (with leading `/`).
    pub fn path_str(&self) -> &str {
        &self.path
    }

    /// Renders the full URL.
    pub fn to_url(&self) -> String {
        let mut url = format!("{}{}", self.base, self.path);
        if !self.params.is_empty() {
            let query: Vec<_> = self
                .params
                .iter()
                .map(|(name, value)| format!("{}={}", urlencoding::encode(name), encode_value(value)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_url())
    }
}

fn encode_value(value: &str) -> String {
    value
        .split('+')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join("+")
}
