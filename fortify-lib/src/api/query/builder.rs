//! Fluent builder for collection queries.

use std::sync::Arc;

use super::DEFAULT_PAGE_SIZE;
use super::Envelope;
use super::EntityQuery;
use super::OrderBy;
use super::QValue;
use super::QueryParams;
use super::RecordEnricher;
use super::RecordProcessor;
use super::TargetUpdater;
use crate::error::Error;
use crate::model::Record;
use crate::ondemand::OnDemandProperty;
use crate::transport::RestConnection;

/// Builder for queries against a collection endpoint.
///
/// Nothing is sent until one of the execution methods is called. Each
/// execution builds a fresh [`EntityQuery`] from the current configuration.
///
/// # Example
///
/// ```ignore
/// use fortify_lib::api::query::OrderBy;
///
/// let versions = client
///     .query("/api/v1/projectVersions")
///     .q_and("project.name", "WebGoat")
///     .fields(["id", "name", "project"])
///     .order_by(OrderBy::desc("creationDate"))
///     .max_results(100)
///     .get_all()
///     .await?;
/// ```
#[derive(Clone)]
pub struct EntityQueryBuilder {
    connection: Arc<dyn RestConnection>,
    path: String,
    segments: Vec<String>,
    params: QueryParams,
    updaters: Vec<Arc<dyn TargetUpdater>>,
    envelope: Envelope,
    paging: bool,
    page_size: usize,
    max_results: Option<usize>,
    enrichers: Vec<Arc<dyn RecordEnricher>>,
}

impl EntityQueryBuilder {
    /// Creates a builder for the collection at `path`.
    pub fn new(connection: Arc<dyn RestConnection>, path: impl Into<String>) -> Self {
        Self {
            connection,
            path: path.into(),
            segments: Vec::new(),
            params: QueryParams::new(),
            updaters: Vec::new(),
            envelope: Envelope::SSC,
            paging: true,
            page_size: DEFAULT_PAGE_SIZE,
            max_results: None,
            enrichers: Vec::new(),
        }
    }

    /// Appends one literal path segment, such as an id taken from user input.
    ///
    /// The segment is percent-encoded as a whole, so `/`, `?` and `#`
    /// cannot change the request path.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Adds an AND-ed `field:value` predicate to `q`.
    pub fn q_and(mut self, field: impl Into<String>, value: impl Into<QValue>) -> Self {
        self.params.add_predicate(field, value);
        self
    }

    /// Sets a literal `q` expression.
    pub fn q(mut self, q: impl Into<String>) -> Self {
        self.params.set_q(q);
        self
    }

    /// Selects the fields to return.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.set_fields(fields);
        self
    }

    /// Sets the result ordering.
    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.params.set_order_by(order_by);
        self
    }

    /// Groups results by a field.
    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.params.set_group_by(field);
        self
    }

    /// Embeds a related entity in each record.
    pub fn embed(mut self, entity: impl Into<String>) -> Self {
        self.params.set_embed(entity);
        self
    }

    /// Adds an AND-ed `field:value` condition to `filters`.
    pub fn filter_and<I, S>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.add_filter(field, values);
        self
    }

    /// Adds an arbitrary query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.add_param(name, value);
        self
    }

    /// Sets a single-valued query parameter, replacing earlier values.
    pub fn set_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set_param(name, value);
        self
    }

    /// Adds a custom target decorator, applied after the query parameters.
    pub fn updater(mut self, updater: impl TargetUpdater + 'static) -> Self {
        self.updaters.push(Arc::new(updater));
        self
    }

    /// Caps the number of records returned.
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Sets the page size.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the paging parameter and response field names of this endpoint.
    pub fn envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    /// Enables or disables offset paging for this endpoint.
    pub fn paging(mut self, paging: bool) -> Self {
        self.paging = paging;
        self
    }

    /// Attaches a lazily loaded property to every record.
    ///
    /// `uri_template` placeholders (`${field.path}`) are filled from each
    /// record. All records of this query share one cache for the property.
    pub fn on_demand(self, name: impl Into<String>, uri_template: impl Into<String>) -> Self {
        let property = OnDemandProperty::new(self.connection.clone(), name, uri_template);
        self.on_demand_property(property)
    }

    /// Attaches a preconfigured on-demand property.
    pub fn on_demand_property(self, property: OnDemandProperty) -> Self {
        self.enricher(property)
    }

    /// Adds a record decorator applied before delivery.
    pub fn enricher(mut self, enricher: impl RecordEnricher + 'static) -> Self {
        self.enrichers.push(Arc::new(enricher));
        self
    }

    /// Returns the query-parameter configuration.
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Returns the connection used by this builder.
    pub fn connection(&self) -> &Arc<dyn RestConnection> {
        &self.connection
    }

    /// Builds the executable query.
    pub fn build(&self) -> EntityQuery {
        let target = self
            .segments
            .iter()
            .fold(self.connection.base_target().path(&self.path), |target, segment| {
                target.segment(segment)
            });
        let target = self
            .params
            .build()
            .iter()
            .chain(self.updaters.iter())
            .fold(target, |target, updater| updater.update(target));

        self.enrichers.iter().cloned().fold(
            EntityQuery::new(self.connection.clone(), target)
                .with_envelope(self.envelope)
                .with_paging(self.paging)
                .with_page_size(self.page_size)
                .with_max_results(self.max_results),
            EntityQuery::with_enricher,
        )
    }

    /// See [`EntityQuery::process_all`].
    pub async fn process_all<P>(&self, processor: &mut P) -> Result<(), Error>
    where
        P: RecordProcessor + ?Sized,
    {
        self.build().process_all(processor).await
    }

    /// See [`EntityQuery::get_all`].
    pub async fn get_all(&self) -> Result<Vec<Record>, Error> {
        self.build().get_all().await
    }

    /// See [`EntityQuery::get_unique`].
    pub async fn get_unique(&self) -> Result<Option<Record>, Error> {
        self.build().get_unique().await
    }

    /// See [`EntityQuery::get_count`].
    pub async fn get_count(&self) -> Result<usize, Error> {
        self.build().get_count().await
    }
}

impl std::fmt::Debug for EntityQueryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityQueryBuilder")
            .field("path", &self.path)
            .field("segments", &self.segments)
            .field("params", &self.params)
            .field("paging", &self.paging)
            .field("page_size", &self.page_size)
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}
