//! Response envelope errors

/// The response does not match the collection envelope, for example
/// `{ "count": <int>, "data": [ {..}, .. ] }`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The response body is not a JSON object.
    #[error("Response is not a JSON object")]
    NotAnObject,

    /// The response has no integer total-count field.
    #[error("Response lacks an integer '{field}' field")]
    MissingCount {
        /// Name of the expected field.
        field: &'static str,
    },

    /// The response has no record array.
    #[error("Response lacks a '{field}' array")]
    MissingData {
        /// Name of the expected field.
        field: &'static str,
    },

    /// An element of the record array is not a JSON object.
    #[error("Record {index} of the page is not a JSON object")]
    InvalidRecord {
        /// Position of the offending element within the page.
        index: usize,
    },
}
