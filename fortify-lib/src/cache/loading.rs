//! Bounded keyed cache with load-once semantics

use std::collections::HashMap;
use std::collections::VecDeque;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::OnceCell;

/// Default number of entries kept by per-parent caches.
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// A bounded cache that loads each missing value at most once.
///
/// Every key maps to a cell that is filled by the first caller; concurrent
/// callers for the same key wait for that load instead of issuing their
/// own. When the cache is full, the least recently used key is evicted.
/// A failed load leaves the cell empty.
///
/// # Example
///
/// ```
/// use fortify_lib::cache::LoadingCache;
///
/// # tokio_test_block(async {
/// let cache: LoadingCache<String, u32> = LoadingCache::new(2);
/// let value = cache
///     .get_or_try_load("a".to_string(), || async { Ok::<_, std::convert::Infallible>(1) })
///     .await
///     .unwrap();
/// assert_eq!(value, 1);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug)]
pub struct LoadingCache<K, V> {
    capacity: usize,
    entries: Mutex<Entries<K, V>>,
}

#[derive(Debug)]
struct Entries<K, V> {
    cells: HashMap<K, Arc<OnceCell<V>>>,
    // Front is least recently used
    order: VecDeque<K>,
}

impl<K, V> Entries<K, V>
where
    K: Eq + Hash + Clone,
{
    fn touch(&mut self, key: &K) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn cell(&mut self, key: K, capacity: usize) -> Arc<OnceCell<V>> {
        if let Some(cell) = self.cells.get(&key).cloned() {
            self.touch(&key);
            return cell;
        }

        while self.cells.len() >= capacity {
            match self.order.pop_front() {
                Some(evicted) => {
                    self.cells.remove(&evicted);
                }
                None => break,
            }
        }

        let cell = Arc::new(OnceCell::new());
        self.cells.insert(key.clone(), cell.clone());
        self.order.push_back(key);
        cell
    }

    fn remove(&mut self, key: &K) {
        self.cells.remove(key);
        self.order.retain(|k| k != key);
    }
}

impl<K, V> LoadingCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(Entries {
                cells: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Returns the maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the cached value for `key`, loading it with `load` if missing.
    ///
    /// The map lock is only held while looking up the cell, so loads for
    /// different keys run concurrently.
    pub async fn get_or_try_load<F, Fut, E>(&self, key: K, load: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = {
            let mut entries = self.entries.lock().await;
            entries.cell(key, self.capacity)
        };
        cell.get_or_try_init(load).await.cloned()
    }

    /// Returns the value for `key` if it has been loaded.
    pub async fn get_if_present(&self, key: &K) -> Option<V> {
        let entries = self.entries.lock().await;
        entries.cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Removes the entry for `key`.
    pub async fn invalidate(&self, key: &K) {
        self.entries.lock().await.remove(key);
    }

    /// Removes all entries.
    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.lock().await;
        entries.cells.clear();
        entries.order.clear();
    }

    /// Returns the number of entries, including ones still loading.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.cells.len()
    }

    /// Returns `true` if the cache has no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<K, V> Default for LoadingCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
