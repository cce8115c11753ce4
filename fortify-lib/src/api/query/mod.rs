//! Query building and execution for collection endpoints.
//!
//! # Building
//!
//! - [`QueryParams`] - `q` predicates, `filters` conditions, field selection, ordering and extra parameters
//! - [`EntityQueryBuilder`] - fluent builder producing an [`EntityQuery`]
//!
//! # Executing
//!
//! - [`EntityQuery`] - offset-paged execution with `process_all`, `get_all`, `get_unique`
//! - [`RecordProcessor`] - sink receiving records in server order
//! - [`PagingCursor`] - paging state handed to processors between pages

mod builder;
mod order;
mod page;
mod paging;
mod params;
mod processor;
mod query;

pub use builder::EntityQueryBuilder;
pub use order::Direction;
pub use order::OrderBy;
pub use page::Envelope;
pub use page::Page;
pub use paging::DEFAULT_PAGE_SIZE;
pub use paging::PagingCursor;
pub use params::QValue;
pub use params::QueryParamUpdater;
pub use params::QueryParams;
pub use params::FILTER_AND_SEPARATOR;
pub use params::Q_AND_SEPARATOR;
pub use params::TargetUpdater;
pub use processor::CollectingProcessor;
pub use processor::RecordEnricher;
pub use processor::RecordProcessor;
pub use query::EntityQuery;
