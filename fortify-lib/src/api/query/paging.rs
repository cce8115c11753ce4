//! Offset paging state.

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Offset-based paging state carried across the pages of one query.
///
/// `start` advances by the number of records delivered from each page.
/// The loop ends once `start` reaches the server-reported total, the
/// caller's maximum, or a page comes back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingCursor {
    start: usize,
    page_size: usize,
    max_results: Option<usize>,
    total: Option<usize>,
    last_page_size: Option<usize>,
}

impl PagingCursor {
    /// Creates a cursor at offset 0. A page size of 0 is treated as 1.
    pub fn new(page_size: usize, max_results: Option<usize>) -> Self {
        Self {
            start: 0,
            page_size: page_size.max(1),
            max_results,
            total: None,
            last_page_size: None,
        }
    }

    /// Offset of the next page.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Configured page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Maximum number of records to deliver, if bounded.
    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    /// Total reported by the most recent page.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// Number of records delivered from the most recent page.
    pub fn last_page_size(&self) -> Option<usize> {
        self.last_page_size
    }

    /// Records still allowed before reaching the maximum.
    pub fn remaining(&self) -> Option<usize> {
        self.max_results.map(|max| max.saturating_sub(self.start))
    }

    /// Limit to request for the next page.
    pub fn limit(&self) -> usize {
        match self.remaining() {
            Some(remaining) => self.page_size.min(remaining),
            None => self.page_size,
        }
    }

    /// Returns `true` if another page should be requested.
    pub fn has_more(&self) -> bool {
        if self.remaining() == Some(0) {
            return false;
        }
        match (self.total, self.last_page_size) {
            (None, _) => true,
            (_, Some(0)) => false,
            (Some(total), _) => self.start < total,
        }
    }

    /// Records the outcome of a page.
    pub fn advance(&mut self, total: usize, delivered: usize) {
        self.total = Some(total);
        self.last_page_size = Some(delivered);
        self.start += delivered;
    }
}

impl Default for PagingCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, None)
    }
}
