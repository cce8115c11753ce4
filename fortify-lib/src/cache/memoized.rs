//! Single-value memoization

use std::future::Future;

use tokio::sync::OnceCell;

/// A value that is loaded on first use and then kept.
///
/// Concurrent first callers share one load. A failed load is not
/// remembered.
#[derive(Debug)]
pub struct Memoized<V> {
    cell: OnceCell<V>,
}

impl<V: Clone> Memoized<V> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Returns the value, loading it with `load` on first use.
    pub async fn get_or_try_load<F, Fut, E>(&self, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.cell.get_or_try_init(load).await.cloned()
    }

    /// Returns the value if it has been loaded.
    pub fn get(&self) -> Option<&V> {
        self.cell.get()
    }
}

impl<V: Clone> Default for Memoized<V> {
    fn default() -> Self {
        Self::new()
    }
}
