//! Query-parameter composition.

use std::sync::Arc;

use super::OrderBy;
use crate::transport::Target;

/// Separator placed between AND-ed predicates of the `q` parameter.
pub const Q_AND_SEPARATOR: &str = "+and+";

/// Separator placed between AND-ed conditions of the `filters` parameter.
pub const FILTER_AND_SEPARATOR: &str = "+";

/// Value of a `q` predicate.
///
/// Text values are quoted (`field:"value"`), everything else is rendered
/// literally (`field:3`, `field:true`).
#[derive(Debug, Clone, PartialEq)]
pub enum QValue {
    /// String literal, rendered quoted.
    Text(String),
    /// Numeric or boolean literal, rendered as is.
    Literal(String),
}

impl std::fmt::Display for QValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "\"{}\"", s),
            Self::Literal(s) => f.write_str(s),
        }
    }
}

impl From<&str> for QValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for QValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

macro_rules! literal_qvalue {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for QValue {
                fn from(value: $ty) -> Self {
                    Self::Literal(value.to_string())
                }
            }
        )*
    };
}

literal_qvalue!(bool, i32, i64, u32, u64, usize, f64);

/// Decorates a [`Target`] right before dispatch.
pub trait TargetUpdater: Send + Sync {
    /// Returns the updated target.
    fn update(&self, target: Target) -> Target;
}

impl<F> TargetUpdater for F
where
    F: Fn(Target) -> Target + Send + Sync,
{
    fn update(&self, target: Target) -> Target {
        self(target)
    }
}

/// Adds a single query parameter; does nothing when the value is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParamUpdater {
    name: String,
    value: Option<String>,
}

impl QueryParamUpdater {
    /// Creates an updater for the given parameter.
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl TargetUpdater for QueryParamUpdater {
    fn update(&self, target: Target) -> Target {
        match &self.value {
            Some(value) => target.query_param(self.name.clone(), value.clone()),
            None => target,
        }
    }
}

/// Builder-owned query configuration.
///
/// Collects `q` predicates, field selection, ordering, grouping, embedding
/// and arbitrary extra parameters. Nothing touches the network; [`build`]
/// turns the configuration into [`TargetUpdater`]s.
///
/// Predicates are AND-ed in insertion order. Adding a predicate for a field
/// that already has one replaces the value in place.
///
/// # Example
///
/// ```
/// use fortify_lib::api::query::QueryParams;
///
/// let mut params = QueryParams::new();
/// params.add_predicate("status", "New").add_predicate("priority", 3);
/// assert_eq!(params.compose_q().as_deref(), Some("status:\"New\"+and+priority:3"));
/// ```
///
/// [`build`]: QueryParams::build
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    predicates: Vec<(String, QValue)>,
    raw_q: Option<String>,
    filters: Vec<(String, String)>,
    fields: Vec<String>,
    order_by: Option<OrderBy>,
    group_by: Option<String>,
    embed: Option<String>,
    extra: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `field:value`, replacing an earlier predicate on the same field.
    pub fn add_predicate(&mut self, field: impl Into<String>, value: impl Into<QValue>) -> &mut Self {
        let field = field.into();
        let value = value.into();
        match self.predicates.iter_mut().find(|(f, _)| *f == field) {
            Some(existing) => existing.1 = value,
            None => self.predicates.push((field, value)),
        }
        self
    }

    /// Sets a literal `q` expression, AND-ed in front of the predicates.
    pub fn set_q(&mut self, q: impl Into<String>) -> &mut Self {
        let q = q.into();
        self.raw_q = if q.trim().is_empty() { None } else { Some(q) };
        self
    }

    /// Records a `filters` condition `field:value`, replacing an earlier one on the same field.
    ///
    /// Filter values are never quoted. Several accepted values for one
    /// field are joined with `|`.
    pub fn add_filter<I, S>(&mut self, field: impl Into<String>, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let field = field.into();
        let value = values.into_iter().map(Into::into).collect::<Vec<String>>().join("|");
        match self.filters.iter_mut().find(|(f, _)| *f == field) {
            Some(existing) => existing.1 = value,
            None => self.filters.push((field, value)),
        }
        self
    }

    /// Composes the `filters` expression, or `None` when no filter is set.
    pub fn compose_filters(&self) -> Option<String> {
        if self.filters.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .filters
            .iter()
            .map(|(field, value)| format!("{}:{}", field, value))
            .collect();
        Some(parts.join(FILTER_AND_SEPARATOR))
    }

    /// Selects the fields to return. An empty list removes the parameter.
    pub fn set_fields<I, S>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the result ordering.
    pub fn set_order_by(&mut self, order_by: OrderBy) -> &mut Self {
        self.order_by = Some(order_by);
        self
    }

    /// Sets the grouping field.
    pub fn set_group_by(&mut self, field: impl Into<String>) -> &mut Self {
        self.group_by = Some(field.into());
        self
    }

    /// Sets the embed directive.
    pub fn set_embed(&mut self, entity: impl Into<String>) -> &mut Self {
        self.embed = Some(entity.into());
        self
    }

    /// Adds an arbitrary query parameter, keeping earlier values of the same name.
    pub fn add_param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.extra.push((name.into(), value.into()));
        self
    }

    /// Sets a single-valued query parameter.
    ///
    /// The first earlier value of `name` is overwritten in place and any
    /// further ones are dropped.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.extra.iter().position(|(n, _)| *n == name) {
            Some(index) => {
                self.extra[index].1 = value;
                let mut first = true;
                self.extra.retain(|(n, _)| *n != name || std::mem::take(&mut first));
            }
            None => self.extra.push((name, value)),
        }
        self
    }

    /// Returns the value of an extra parameter; the first one if repeated.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.extra.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Returns the predicates in insertion order.
    pub fn predicates(&self) -> &[(String, QValue)] {
        &self.predicates
    }

    /// Composes the `q` expression, or `None` when there is nothing to filter on.
    pub fn compose_q(&self) -> Option<String> {
        let parts: Vec<String> = self
            .raw_q
            .iter()
            .cloned()
            .chain(self.predicates.iter().map(|(field, value)| format!("{}:{}", field, value)))
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(Q_AND_SEPARATOR))
        }
    }

    /// Builds the decorators for this configuration.
    ///
    /// Parameters that are not configured yield no-op updaters, so they
    /// never appear on the target.
    pub fn build(&self) -> Vec<Arc<dyn TargetUpdater>> {
        let fields = (!self.fields.is_empty()).then(|| self.fields.join(","));

        let mut updaters: Vec<Arc<dyn TargetUpdater>> = vec![
            Arc::new(QueryParamUpdater::new("q", self.compose_q())),
            Arc::new(QueryParamUpdater::new("filters", self.compose_filters())),
            Arc::new(QueryParamUpdater::new("fields", fields)),
            Arc::new(QueryParamUpdater::new(
                "orderby",
                self.order_by.as_ref().map(OrderBy::to_param),
            )),
            Arc::new(QueryParamUpdater::new("groupby", self.group_by.clone())),
            Arc::new(QueryParamUpdater::new("embed", self.embed.clone())),
        ];

        updaters.extend(
            self.extra
                .iter()
                .map(|(name, value)| Arc::new(QueryParamUpdater::new(name.clone(), Some(value.clone()))) as Arc<dyn TargetUpdater>),
        );

        updaters
    }

    /// Applies every decorator from [`build`](Self::build) to `target`.
    pub fn apply(&self, target: Target) -> Target {
        self.build().iter().fold(target, |target, updater| updater.update(target))
    }
}
