//! Shared test fixtures.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fortify_lib::error::Error;
use fortify_lib::transport::RestConnection;
use fortify_lib::transport::RestRequest;
use fortify_lib::transport::Target;
use serde_json::Value;
use serde_json::json;

pub const BASE_URL: &str = "https://ssc.example.com/ssc";

type Handler = dyn Fn(&RestRequest) -> Result<Value, Error> + Send + Sync;

/// In-memory connection answering requests from a handler and recording them.
pub struct ScriptedConnection {
    base: Target,
    handler: Box<Handler>,
    requests: Mutex<Vec<RestRequest>>,
    delay: Option<Duration>,
}

impl ScriptedConnection {
    pub fn new(handler: impl Fn(&RestRequest) -> Result<Value, Error> + Send + Sync + 'static) -> Self {
        Self {
            base: Target::parse(BASE_URL).unwrap(),
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Suspends every request for `delay`, so concurrent callers interleave.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> Vec<RestRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `(start, limit)` of every recorded request.
    pub fn paging_params(&self) -> Vec<(Option<usize>, Option<usize>)> {
        self.requests()
            .iter()
            .map(|r| (usize_param(r, "start"), usize_param(r, "limit")))
            .collect()
    }
}

#[async_trait]
impl RestConnection for ScriptedConnection {
    fn base_target(&self) -> Target {
        self.base.clone()
    }

    async fn execute(&self, request: RestRequest) -> Result<Value, Error> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(&request)
    }
}

pub fn usize_param(request: &RestRequest, name: &str) -> Option<usize> {
    request.target.get_query_param(name)?.parse().ok()
}

/// A paged collection of `total` records `{"id": i}` that honours start/limit.
pub fn collection(total: usize) -> impl Fn(&RestRequest) -> Result<Value, Error> + Send + Sync + 'static {
    move |request: &RestRequest| -> Result<Value, Error> {
        let start = usize_param(request, "start").unwrap_or(0);
        let limit = usize_param(request, "limit").unwrap_or(total);
        let end = start.saturating_add(limit).min(total);
        let data: Vec<Value> = (start.min(end)..end).map(|i| json!({"id": i})).collect();
        Ok(json!({"count": total, "data": data}))
    }
}

pub fn ids(records: &[fortify_lib::model::Record]) -> Vec<i64> {
    records.iter().filter_map(|r| r.get_i64("id")).collect()
}
