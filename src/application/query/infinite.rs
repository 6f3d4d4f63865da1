//! Infinite-scroll query binding
//!
//! Drives a [`PageAccumulator`] against a [`PageSource`]: one fetch at a
//! time per key, next page on reaching the bottom of the viewport, full
//! reset whenever the query key changes.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::accumulator::{AccumulatorSnapshot, ApplyOutcome, PageAccumulator, PageTicket};
use crate::domain::{PageSource, QueryKey, QueryOptions};
use crate::shared::{FetchError, PageRequest};

/// Scroll geometry of the list container, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub client_height: f64,
    pub scroll_height: f64,
}

impl Viewport {
    pub fn new(scroll_top: f64, client_height: f64, scroll_height: f64) -> Self {
        Self {
            scroll_top,
            client_height,
            scroll_height,
        }
    }

    /// Distance left to scroll before the bottom edge
    pub fn remaining(&self) -> f64 {
        (self.scroll_height - self.scroll_top - self.client_height).max(0.0)
    }

    /// Bottom reached, allowing for sub-pixel scroll offsets
    pub fn at_bottom(&self) -> bool {
        self.remaining() < 1.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Appended { page: u32, received: usize },
    /// Last page already loaded
    Exhausted,
    /// A fetch for this key is already in flight
    Busy,
    /// Scroll trigger without reaching the bottom
    NotAtBottom,
    Failed(FetchError),
    /// Key changed while fetching; response discarded
    Stale,
    /// Page 1 was already loaded for this key
    AlreadyLoaded,
}

pub struct InfiniteQuery<T> {
    source: Arc<dyn PageSource<T>>,
    options: QueryOptions,
    state: Mutex<PageAccumulator<T>>,
}

impl<T> InfiniteQuery<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(source: Arc<dyn PageSource<T>>, key: QueryKey, options: QueryOptions) -> Self {
        Self {
            source,
            options,
            state: Mutex::new(PageAccumulator::new(key)),
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub async fn key(&self) -> QueryKey {
        self.state.lock().await.key().clone()
    }

    /// Switch keys. Accumulated pages are dropped and any fetch still in
    /// flight for the old key becomes stale.
    pub async fn set_key(&self, key: QueryKey) -> bool {
        let changed = self.state.lock().await.reset(key.clone());
        if changed {
            debug!(resource = self.source.resource(), key = %key, "Query key changed, pages reset");
        }
        changed
    }

    /// Fetch the next page, if there is one and nothing is in flight
    pub async fn load_next(&self) -> LoadOutcome {
        let ticket = {
            let mut acc = self.state.lock().await;
            if acc.is_loading() {
                return LoadOutcome::Busy;
            }
            match acc.next_ticket() {
                Some(ticket) => ticket,
                None => return LoadOutcome::Exhausted,
            }
        };
        self.fetch(ticket).await
    }

    /// Fetch page 1 unless something is already loaded or in flight for the
    /// current key. Used after mount and key changes.
    pub async fn load_first(&self) -> LoadOutcome {
        let ticket = {
            let mut acc = self.state.lock().await;
            if acc.is_loading() {
                return LoadOutcome::Busy;
            }
            match acc.first_ticket() {
                Some(ticket) => ticket,
                None => return LoadOutcome::AlreadyLoaded,
            }
        };
        self.fetch(ticket).await
    }

    async fn fetch(&self, ticket: PageTicket) -> LoadOutcome {
        let request = PageRequest::first(&self.options, &ticket.key.term).with_page(ticket.page);
        let result = self.source.fetch_page(&request).await;

        let outcome = self.state.lock().await.apply(&ticket, result);
        match outcome {
            ApplyOutcome::Appended { page, received } => {
                debug!(resource = self.source.resource(), key = %ticket.key, page, received, "Page appended");
                LoadOutcome::Appended { page, received }
            }
            ApplyOutcome::Failed(err) => {
                warn!(resource = self.source.resource(), key = %ticket.key, page = ticket.page, error = %err, "Page fetch failed");
                LoadOutcome::Failed(err)
            }
            ApplyOutcome::Stale => {
                debug!(resource = self.source.resource(), key = %ticket.key, page = ticket.page, "Discarding stale page");
                LoadOutcome::Stale
            }
        }
    }

    /// Scroll trigger: loads the next page only once the bottom is reached
    pub async fn on_scroll(&self, viewport: Viewport) -> LoadOutcome {
        if !viewport.at_bottom() {
            return LoadOutcome::NotAtBottom;
        }
        self.load_next().await
    }

    pub async fn snapshot(&self) -> AccumulatorSnapshot<T> {
        self.state.lock().await.snapshot()
    }

    /// React to key changes: load page 1 for the current key, then reset and
    /// reload once per published change. Abort the handle to stop following.
    ///
    /// Page loads run as their own tasks so a new key is never blocked behind
    /// a slow response for the old one; that response arrives stale.
    pub fn follow(self: Arc<Self>, mut keys: watch::Receiver<QueryKey>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let initial = keys.borrow_and_update().clone();
            self.set_key(initial).await;
            self.spawn_load();

            while keys.changed().await.is_ok() {
                let key = keys.borrow_and_update().clone();
                if self.set_key(key).await {
                    self.spawn_load();
                }
            }
        })
    }

    fn spawn_load(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.load_first().await;
        });
    }
}
