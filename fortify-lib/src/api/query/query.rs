//! Paging query executor.

use std::sync::Arc;

use log::debug;

use super::CollectingProcessor;
use super::DEFAULT_PAGE_SIZE;
use super::Envelope;
use super::Page;
use super::PagingCursor;
use super::RecordEnricher;
use super::RecordProcessor;
use crate::error::Error;
use crate::model::Record;
use crate::transport::RestConnection;
use crate::transport::RestRequest;
use crate::transport::Target;

/// A fully configured query against one collection endpoint.
///
/// The target already carries every query parameter except the paging
/// pair (`start`/`limit` for SSC, `offset`/`limit` for FoD, see
/// [`Envelope`]), which the executor adds per page. Executing a query never
/// mutates it, so the same query can run any number of times.
///
/// Usually obtained from [`EntityQueryBuilder::build`](super::EntityQueryBuilder::build).
#[derive(Clone)]
pub struct EntityQuery {
    connection: Arc<dyn RestConnection>,
    target: Target,
    envelope: Envelope,
    paging: bool,
    page_size: usize,
    max_results: Option<usize>,
    enrichers: Vec<Arc<dyn RecordEnricher>>,
}

impl EntityQuery {
    /// Creates a paged query with the default page size and no maximum.
    pub fn new(connection: Arc<dyn RestConnection>, target: Target) -> Self {
        Self {
            connection,
            target,
            envelope: Envelope::SSC,
            paging: true,
            page_size: DEFAULT_PAGE_SIZE,
            max_results: None,
            enrichers: Vec::new(),
        }
    }

    /// Enables or disables offset paging.
    ///
    /// Unpaged endpoints are fetched with a single request and no
    /// `start`/`limit` parameters.
    pub fn with_paging(mut self, paging: bool) -> Self {
        self.paging = paging;
        self
    }

    /// Sets the paging parameter and response field names.
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = envelope;
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Caps the number of records delivered.
    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }

    /// Adds a record decorator applied before delivery.
    pub fn with_enricher(mut self, enricher: Arc<dyn RecordEnricher>) -> Self {
        self.enrichers.push(enricher);
        self
    }

    /// Returns the target, without paging parameters.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Returns `true` if the query pages through results.
    pub fn is_paging(&self) -> bool {
        self.paging
    }

    /// Delivers every matching record, in server order, to `processor`.
    ///
    /// Pages are fetched sequentially, each with `start` set to the number
    /// of records delivered so far. At most `max_results` records are
    /// delivered; a maximum of zero performs no request.
    pub async fn process_all<P>(&self, processor: &mut P) -> Result<(), Error>
    where
        P: RecordProcessor + ?Sized,
    {
        let mut cursor = PagingCursor::new(self.page_size, self.max_results);

        while cursor.has_more() {
            processor.next_page(&cursor);

            let target = if self.paging {
                self.paged_target(cursor.start(), cursor.limit())
            } else {
                self.target.clone()
            };
            let page = self.fetch(target).await?;

            let total = match page.count() {
                Some(count) if self.paging => count,
                // Unpaged endpoints return everything at once
                _ => cursor.start() + page.len(),
            };

            let mut records = page.into_records();
            if let Some(remaining) = cursor.remaining() {
                records.truncate(remaining);
            }

            debug!(
                "Fetched page at start={} of {}: {} records (total {})",
                cursor.start(),
                self.target.path_str(),
                records.len(),
                total
            );

            cursor.advance(total, records.len());

            for record in records {
                processor.process(self.enrich(record))?;
            }
        }

        Ok(())
    }

    /// Collects every matching record.
    pub async fn get_all(&self) -> Result<Vec<Record>, Error> {
        let mut collector = CollectingProcessor::new();
        self.process_all(&mut collector).await?;
        Ok(collector.into_records())
    }

    /// Returns the single matching record, or `None` if there is none.
    ///
    /// Issues one request for the first page only. Fails with
    /// [`Error::Cardinality`] if that page holds more than one record.
    pub async fn get_unique(&self) -> Result<Option<Record>, Error> {
        let target = if self.paging {
            self.paged_target(0, 1)
        } else {
            self.target.clone()
        };

        let mut records = self.fetch(target).await?.into_records();
        match records.len() {
            0 => Ok(None),
            1 => Ok(records.pop().map(|record| self.enrich(record))),
            found => Err(Error::Cardinality { found }),
        }
    }

    /// Count-only queries are not provided by this API.
    pub async fn get_count(&self) -> Result<usize, Error> {
        Err(Error::Unsupported("count-only queries"))
    }

    fn paged_target(&self, start: usize, limit: usize) -> Target {
        self.target
            .clone()
            .replace_query_param(self.envelope.start_param, Some(start.to_string()))
            .replace_query_param(self.envelope.limit_param, Some(limit.to_string()))
    }

    async fn fetch(&self, target: Target) -> Result<Page, Error> {
        let response = self.connection.execute(RestRequest::get(target)).await?;
        Ok(Page::from_envelope(response, &self.envelope, self.paging)?)
    }

    fn enrich(&self, mut record: Record) -> Record {
        for enricher in &self.enrichers {
            enricher.enrich(&mut record);
        }
        record
    }
}

impl std::fmt::Debug for EntityQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityQuery")
            .field("target", &self.target)
            .field("envelope", &self.envelope)
            .field("paging", &self.paging)
            .field("page_size", &self.page_size)
            .field("max_results", &self.max_results)
            .finish_non_exhaustive()
    }
}
