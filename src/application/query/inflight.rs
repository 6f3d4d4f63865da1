//! Fetch-in-flight dedup
//!
//! Identical requests issued while one is already on the wire join it
//! instead of sending a second request. Nothing is cached past completion.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use crate::domain::PageSource;
use crate::shared::{FetchResult, PageRequest, PagedResult};

type SharedFetch<T> = Shared<BoxFuture<'static, FetchResult<PagedResult<T>>>>;

/// [`PageSource`] decorator sharing in-flight fetches between callers
pub struct DedupSource<T> {
    inner: Arc<dyn PageSource<T>>,
    inflight: DashMap<PageRequest, SharedFetch<T>>,
}

impl<T> DedupSource<T> {
    pub fn new(inner: Arc<dyn PageSource<T>>) -> Self {
        Self {
            inner,
            inflight: DashMap::new(),
        }
    }

    /// Requests currently on the wire
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }
}

#[async_trait]
impl<T> PageSource<T> for DedupSource<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn fetch_page(&self, request: &PageRequest) -> FetchResult<PagedResult<T>> {
        let fetch = match self.inflight.entry(request.clone()) {
            Entry::Occupied(entry) => {
                debug!(
                    resource = self.inner.resource(),
                    page = request.page,
                    "Joining in-flight fetch"
                );
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let inner = Arc::clone(&self.inner);
                let owned = request.clone();
                let fetch = async move { inner.fetch_page(&owned).await }
                    .boxed()
                    .shared();
                entry.insert(fetch.clone());
                fetch
            }
        };

        let result = fetch.await;

        // Only evict a finished entry; a newer fetch may have replaced it
        self.inflight
            .remove_if(request, |_, stored| stored.peek().is_some());

        result
    }

    fn resource(&self) -> &str {
        self.inner.resource()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::query::test_support::{RangeSource, Row};
    use crate::domain::QueryOptions;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_identical_requests_share_one_fetch() {
        let inner = Arc::new(RangeSource::new("rooms", 25).delay("Room A", Duration::from_millis(50)));
        let dedup = DedupSource::<Row>::new(inner.clone());
        let request = PageRequest::first(&QueryOptions::default(), "Room A");

        let (a, b) = tokio::join!(dedup.fetch_page(&request), dedup.fetch_page(&request));

        assert_eq!(a, b);
        assert_eq!(a.unwrap().items.len(), 10);
        assert_eq!(inner.request_count(), 1);
        assert_eq!(dedup.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_requests_are_not_cached() {
        let inner = Arc::new(RangeSource::new("rooms", 25));
        let dedup = DedupSource::<Row>::new(inner.clone());
        let request = PageRequest::first(&QueryOptions::default(), "");

        dedup.fetch_page(&request).await.unwrap();
        dedup.fetch_page(&request).await.unwrap();
        assert_eq!(inner.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_pages_are_separate_fetches() {
        let inner = Arc::new(RangeSource::new("rooms", 25).delay("", Duration::from_millis(50)));
        let dedup = DedupSource::<Row>::new(inner.clone());
        let first = PageRequest::first(&QueryOptions::default(), "");
        let second = first.clone().with_page(2);

        let (a, b) = tokio::join!(dedup.fetch_page(&first), dedup.fetch_page(&second));
        assert_eq!(a.unwrap().metadata.page, 1);
        assert_eq!(b.unwrap().metadata.page, 2);
        assert_eq!(inner.request_count(), 2);
        assert_eq!(dedup.resource(), "rooms");
    }
}
