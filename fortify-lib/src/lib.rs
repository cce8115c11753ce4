//! Fortify REST client library
//!
//! An async client core for the Fortify REST APIs: composable collection
//! queries with transparent offset paging, OAuth token management, and
//! lazily loaded record properties.
//!
//! - [`api::query`] - query builder and paging executor
//! - [`api`] - per-resource queries and custom tag support
//! - [`auth`] - token factory and credentials
//! - [`transport`] - the [`transport::RestConnection`] capability and its HTTP implementation
//! - [`cache`] - load-once caches
//! - [`ondemand`] - on-demand record properties

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod ondemand;
pub mod transport;

mod client;

pub use client::*;
