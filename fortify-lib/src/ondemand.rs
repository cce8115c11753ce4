//! On-demand record properties.
//!
//! An on-demand property is a value that belongs to a record but lives at
//! another endpoint, for example the application that owns a version. The
//! URI is a template such as `/api/v1/projects/${project.id}` whose
//! placeholders are filled from the record's fields. Nothing is fetched
//! until the property is read; results are shared across all records that
//! resolve to the same URI.

use std::sync::Arc;
use std::sync::LazyLock;

use log::debug;
use regex::Captures;
use regex::Regex;
use serde_json::Value;

use crate::api::query::RecordEnricher;
use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::cache::LoadingCache;
use crate::error::Error;
use crate::model::Record;
use crate::transport::RestConnection;
use crate::transport::RestRequest;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("Invalid regex pattern"));

/// Fills `${field.path}` placeholders from the record.
///
/// Returns `None` if any referenced field is missing or not a scalar.
pub fn resolve_uri_template(template: &str, record: &Record) -> Option<String> {
    let mut missing = false;
    let resolved = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        match record.get_text(&caps[1]) {
            Some(text) => text,
            None => {
                missing = true;
                String::new()
            }
        }
    });
    (!missing).then(|| resolved.into_owned())
}

struct OnDemandSource {
    connection: Arc<dyn RestConnection>,
    cache: LoadingCache<String, Value>,
}

impl OnDemandSource {
    async fn load(&self, uri: &str) -> Result<Value, Error> {
        let target = self.connection.base_target().relative(uri);
        debug!("Loading on-demand value from {}", target);
        let response = self.connection.execute(RestRequest::get(target)).await?;
        Ok(unwrap_data(response))
    }
}

/// Single-entity responses wrap the entity in a `data` member.
fn unwrap_data(response: Value) -> Value {
    match response {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

/// A named property loaded from a URI template when first read.
///
/// Attach it to a query with
/// [`EntityQueryBuilder::on_demand`](crate::api::query::EntityQueryBuilder::on_demand).
#[derive(Clone)]
pub struct OnDemandProperty {
    name: String,
    uri_template: String,
    source: Arc<OnDemandSource>,
}

impl OnDemandProperty {
    /// Creates a property with a cache of [`DEFAULT_CACHE_CAPACITY`] entries.
    pub fn new(
        connection: Arc<dyn RestConnection>,
        name: impl Into<String>,
        uri_template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            uri_template: uri_template.into(),
            source: Arc::new(OnDemandSource {
                connection,
                cache: LoadingCache::new(DEFAULT_CACHE_CAPACITY),
            }),
        }
    }

    /// Restricts the loaded entity to the given fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields: Vec<String> = fields.into_iter().map(|f| f.as_ref().to_string()).collect();
        if !fields.is_empty() {
            let separator = if self.uri_template.contains('?') { '&' } else { '?' };
            self.uri_template = format!("{}{}fields={}", self.uri_template, separator, fields.join(","));
        }
        self
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the URI template.
    pub fn uri_template(&self) -> &str {
        &self.uri_template
    }

    /// Builds the lazy value for a record, or `None` if the template cannot
    /// be resolved from its fields.
    pub fn value_for(&self, record: &Record) -> Option<OnDemandValue> {
        let uri = resolve_uri_template(&self.uri_template, record)?;
        Some(OnDemandValue {
            uri,
            source: self.source.clone(),
        })
    }
}

impl RecordEnricher for OnDemandProperty {
    fn enrich(&self, record: &mut Record) {
        match self.value_for(record) {
            Some(value) => record.attach_on_demand(self.name.clone(), value),
            None => debug!(
                "Not attaching on-demand property '{}': unresolved placeholders in {}",
                self.name, self.uri_template
            ),
        }
    }
}

impl std::fmt::Debug for OnDemandProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnDemandProperty")
            .field("name", &self.name)
            .field("uri_template", &self.uri_template)
            .finish_non_exhaustive()
    }
}

/// A value fetched from a fixed URI on first access, then cached.
///
/// Clones share the same cache. A failed load is returned to the caller
/// and retried on the next access.
#[derive(Clone)]
pub struct OnDemandValue {
    uri: String,
    source: Arc<OnDemandSource>,
}

impl OnDemandValue {
    /// Returns the resolved URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the value, loading it on first access.
    pub async fn get(&self) -> Result<Value, Error> {
        self.source
            .cache
            .get_or_try_load(self.uri.clone(), || self.source.load(&self.uri))
            .await
    }

    /// Returns the value if it has already been loaded.
    pub async fn get_if_loaded(&self) -> Option<Value> {
        self.source.cache.get_if_present(&self.uri).await
    }
}

impl std::fmt::Debug for OnDemandValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnDemandValue").field("uri", &self.uri).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_resolve_nested_placeholder() {
        let record = Record::from_value(json!({"id": 5, "project": {"id": 9}})).unwrap();
        assert_eq!(
            resolve_uri_template("/api/v1/projects/${project.id}", &record).as_deref(),
            Some("/api/v1/projects/9")
        );
        assert_eq!(
            resolve_uri_template("/api/v1/projectVersions/${id}/attributes", &record).as_deref(),
            Some("/api/v1/projectVersions/5/attributes")
        );
    }

    #[test]
    fn test_unresolved_placeholder() {
        let record = Record::from_value(json!({"id": 5})).unwrap();
        assert_eq!(resolve_uri_template("/api/v1/projects/${project.id}", &record), None);
    }

    #[test]
    fn test_unwrap_data_envelope() {
        assert_eq!(unwrap_data(json!({"data": {"id": 1}, "responseCode": 200})), json!({"id": 1}));
        assert_eq!(unwrap_data(json!({"id": 1})), json!({"id": 1}));
    }
}
