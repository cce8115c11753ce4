//! Dynamic JSON record

use std::collections::BTreeMap;

use serde_json::Map;
use serde_json::Value;

use crate::error::Error;
use crate::ondemand::OnDemandValue;

/// A single entity record as returned by the server.
///
/// Fields are kept as a JSON object. Getters accept dotted paths such as
/// `project.name` to reach into nested objects. Properties registered with
/// [`EntityQueryBuilder::on_demand`](crate::api::query::EntityQueryBuilder::on_demand)
/// are attached to each record and resolved with [`Record::on_demand`].
///
/// # Example
///
/// ```
/// use fortify_lib::model::Record;
/// use serde_json::json;
///
/// let record = Record::from_value(json!({"id": 7, "project": {"name": "demo"}})).unwrap();
/// assert_eq!(record.get_i64("id"), Some(7));
/// assert_eq!(record.get_str("project.name"), Some("demo"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Map<String, Value>,
    on_demand: BTreeMap<String, OnDemandValue>,
}

impl Record {
    /// Creates a record from a JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            on_demand: BTreeMap::new(),
        }
    }

    /// Creates a record from a JSON value, or `None` if it is not an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::new(fields)),
            _ => None,
        }
    }

    /// Returns the value at a (possibly dotted) path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = self.fields.get(segments.next()?)?;
        segments.try_fold(first, |value, segment| value.as_object()?.get(segment))
    }

    /// Returns a string field.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    /// Returns an integer field.
    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path)?.as_i64()
    }

    /// Returns an unsigned integer field.
    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path)?.as_u64()
    }

    /// Returns a boolean field.
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// Renders a scalar field as text: strings as is, numbers and booleans
    /// through their JSON form.
    pub fn get_text(&self, path: &str) -> Option<String> {
        match self.get(path)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Sets a top-level field.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns the raw fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Consumes the record, returning its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Returns the record as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Attaches an on-demand property.
    pub fn attach_on_demand(&mut self, name: impl Into<String>, value: OnDemandValue) {
        self.on_demand.insert(name.into(), value);
    }

    /// Returns `true` if an on-demand property of that name is attached.
    pub fn has_on_demand(&self, name: &str) -> bool {
        self.on_demand.contains_key(name)
    }

    /// Names of the attached on-demand properties.
    pub fn on_demand_names(&self) -> impl Iterator<Item = &str> {
        self.on_demand.keys().map(String::as_str)
    }

    /// Resolves an on-demand property.
    ///
    /// The first call for a given URI performs the request; later calls,
    /// from this or any other record sharing the property, reuse the
    /// result. Returns `Ok(None)` when no property of that name is attached.
    pub async fn on_demand(&self, name: &str) -> Result<Option<Value>, Error> {
        match self.on_demand.get(name) {
            Some(value) => value.get().await.map(Some),
            None => Ok(None),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record() -> Record {
        Record::from_value(json!({
            "id": 12,
            "name": "1.0",
            "active": true,
            "project": {"id": 3, "name": "demo"}
        }))
        .unwrap()
    }

    #[test]
    fn test_dotted_paths() {
        let record = record();
        assert_eq!(record.get_str("project.name"), Some("demo"));
        assert_eq!(record.get_u64("project.id"), Some(3));
        assert_eq!(record.get("project.missing"), None);
        assert_eq!(record.get("name.nested"), None);
    }

    #[test]
    fn test_typed_getters() {
        let record = record();
        assert_eq!(record.get_i64("id"), Some(12));
        assert_eq!(record.get_bool("active"), Some(true));
        assert_eq!(record.get_str("id"), None);
        assert_eq!(record.get_text("id").as_deref(), Some("12"));
        assert_eq!(record.get_text("project"), None);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Record::from_value(json!([1, 2])).is_none());
        assert!(Record::from_value(json!("text")).is_none());
    }

    #[tokio::test]
    async fn test_missing_on_demand_is_none() {
        let record = record().set("extra", "x");
        assert_eq!(record.get_str("extra"), Some("x"));
        assert!(!record.has_on_demand("application"));
        assert_eq!(record.on_demand("application").await.unwrap(), None);
    }
}
