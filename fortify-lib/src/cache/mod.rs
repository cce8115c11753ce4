//! Load-once caches for lazily fetched server data.
//!
//! [`LoadingCache`] holds a bounded number of keyed values, [`Memoized`]
//! a single value. Both guarantee that concurrent callers asking for the
//! same missing value trigger a single load, and both leave the slot empty
//! when a load fails so that the next caller retries.

mod loading;
mod memoized;

pub use loading::*;
pub use memoized::*;
