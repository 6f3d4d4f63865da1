//! In-memory page sources for query tests

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Identified, PageSource};
use crate::shared::{FetchError, FetchResult, PageRequest, PagedResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: u32,
    pub term: String,
}

impl Identified for Row {
    fn identity(&self) -> String {
        format!("{}:{}", self.term, self.id)
    }
}

/// Serves rows `1..=total` for any keyword, optionally slow or failing
pub struct RangeSource {
    resource: String,
    total: u32,
    delays: HashMap<String, Duration>,
    fail_once: Mutex<HashSet<u32>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl RangeSource {
    pub fn new(resource: &str, total: u32) -> Self {
        Self {
            resource: resource.to_string(),
            total,
            delays: HashMap::new(),
            fail_once: Mutex::new(HashSet::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Delay responses for `keyword` ("" for no keyword)
    pub fn delay(mut self, keyword: &str, delay: Duration) -> Self {
        self.delays.insert(keyword.to_string(), delay);
        self
    }

    /// First fetch of `page` fails with a transport error
    pub fn fail_page_once(self, page: u32) -> Self {
        self.fail_once.lock().unwrap().insert(page);
        self
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PageSource<Row> for RangeSource {
    async fn fetch_page(&self, request: &PageRequest) -> FetchResult<PagedResult<Row>> {
        self.requests.lock().unwrap().push(request.clone());

        let term = request.keyword.clone().unwrap_or_default();
        if let Some(delay) = self.delays.get(&term) {
            tokio::time::sleep(*delay).await;
        }

        if self.fail_once.lock().unwrap().remove(&request.page) {
            return Err(FetchError::Transport("connection reset".into()));
        }

        let size = request.page_size;
        let start = (request.page - 1) * size + 1;
        let end = (request.page * size).min(self.total);
        let items = (start..=end)
            .map(|id| Row {
                id,
                term: term.clone(),
            })
            .collect();

        Ok(PagedResult::slice(
            items,
            request.page,
            size,
            u64::from(self.total),
        ))
    }

    fn resource(&self) -> &str {
        &self.resource
    }
}
