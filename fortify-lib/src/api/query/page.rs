//! Page type for paginated query results.

use serde_json::Value;

use crate::error::ProtocolError;
use crate::model::Record;

/// Names used by a collection endpoint for paging parameters and response fields.
///
/// SSC pages with `start`/`limit` and answers `{"count": N, "data": [...]}`.
/// FoD pages with `offset`/`limit` and answers `{"totalCount": N, "items": [...]}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope {
    /// Query parameter carrying the offset of the first record.
    pub start_param: &'static str,
    /// Query parameter carrying the page size.
    pub limit_param: &'static str,
    /// Response field holding the total number of matching records.
    pub count_field: &'static str,
    /// Response field holding the records of the page.
    pub data_field: &'static str,
}

impl Envelope {
    /// Software Security Center collections.
    pub const SSC: Self = Self {
        start_param: "start",
        limit_param: "limit",
        count_field: "count",
        data_field: "data",
    };

    /// Fortify on Demand collections.
    pub const FOD: Self = Self {
        start_param: "offset",
        limit_param: "limit",
        count_field: "totalCount",
        data_field: "items",
    };
}

impl Default for Envelope {
    fn default() -> Self {
        Self::SSC
    }
}

/// A single page of results: the records plus the server-reported total.
///
/// The total is the number of matching records across all pages, not the
/// size of this page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    records: Vec<Record>,
    count: Option<usize>,
}

impl Page {
    /// Creates a page from records and an optional total count.
    pub fn new(records: Vec<Record>, count: Option<usize>) -> Self {
        Self { records, count }
    }

    /// Parses an SSC collection response.
    ///
    /// `count` is required when `require_count` is set (paged endpoints);
    /// non-paged endpoints may omit it.
    pub fn from_json(response: Value, require_count: bool) -> Result<Self, ProtocolError> {
        Self::from_envelope(response, &Envelope::SSC, require_count)
    }

    /// Parses a collection response shaped as `envelope` describes.
    pub fn from_envelope(response: Value, envelope: &Envelope, require_count: bool) -> Result<Self, ProtocolError> {
        let Value::Object(mut body) = response else {
            return Err(ProtocolError::NotAnObject);
        };

        let missing_count = ProtocolError::MissingCount {
            field: envelope.count_field,
        };
        let count = match body.get(envelope.count_field) {
            Some(value) => Some(value.as_u64().map(|n| n as usize).ok_or(missing_count)?),
            None if require_count => return Err(missing_count),
            None => None,
        };

        let Some(Value::Array(data)) = body.remove(envelope.data_field) else {
            return Err(ProtocolError::MissingData {
                field: envelope.data_field,
            });
        };

        let records = data
            .into_iter()
            .enumerate()
            .map(|(index, value)| Record::from_value(value).ok_or(ProtocolError::InvalidRecord { index }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { records, count })
    }

    /// Returns the records in this page.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Consumes the page and returns the records.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// Returns the server-reported total count, if present.
    pub fn count(&self) -> Option<usize> {
        self.count
    }

    /// Returns the number of records in this page.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the page has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
