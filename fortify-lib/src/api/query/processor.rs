//! Record sinks and record decorators used by the paging loop.

use crate::error::Error;
use crate::model::Record;

use super::PagingCursor;

/// Receives records from a paging query in server order.
///
/// [`next_page`](Self::next_page) is called once per page, before any
/// record of that page is delivered. Returning an error from
/// [`process`](Self::process) stops the query and propagates the error.
///
/// Closures taking a [`Record`] implement this trait.
pub trait RecordProcessor {
    /// Notification that a new page is about to be fetched.
    fn next_page(&mut self, _cursor: &PagingCursor) {}

    /// Handles a single record.
    fn process(&mut self, record: Record) -> Result<(), Error>;
}

impl<F> RecordProcessor for F
where
    F: FnMut(Record) -> Result<(), Error>,
{
    fn process(&mut self, record: Record) -> Result<(), Error> {
        self(record)
    }
}

/// Collects every record into a `Vec`.
#[derive(Debug, Default)]
pub struct CollectingProcessor {
    records: Vec<Record>,
}

impl CollectingProcessor {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

impl RecordProcessor for CollectingProcessor {
    fn process(&mut self, record: Record) -> Result<(), Error> {
        self.records.push(record);
        Ok(())
    }
}

/// Decorates each record before it reaches the processor.
pub trait RecordEnricher: Send + Sync {
    /// Adjusts the record in place.
    fn enrich(&self, record: &mut Record);
}
