//! Debounced query key
//!
//! Turns a stream of search-term edits into a stream of [`QueryKey`]s that
//! only changes once the term has been stable for the quiet period. Before
//! the binding is mounted the delay is zero, so the first page is never held
//! back artificially.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::domain::QueryKey;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct DebouncedQuery {
    delay: Duration,
    preloading: bool,
    sender: Arc<watch::Sender<QueryKey>>,
    pending: Option<JoinHandle<()>>,
}

impl DebouncedQuery {
    /// The initial key is current immediately; subscribers see it without waiting.
    pub fn new(resource: impl Into<String>, initial_term: impl Into<String>, delay: Duration) -> Self {
        let (sender, _) = watch::channel(QueryKey::new(resource, initial_term));
        Self {
            delay,
            preloading: true,
            sender: Arc::new(sender),
            pending: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryKey> {
        self.sender.subscribe()
    }

    /// Currently published key
    pub fn current(&self) -> QueryKey {
        self.sender.borrow().clone()
    }

    /// End the preload phase; from now on term changes wait out the delay
    pub fn mark_mounted(&mut self) {
        self.preloading = false;
    }

    pub fn is_preloading(&self) -> bool {
        self.preloading
    }

    pub fn effective_delay(&self) -> Duration {
        if self.preloading {
            Duration::ZERO
        } else {
            self.delay
        }
    }

    /// Whether a term change is still waiting out the quiet period
    pub fn has_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Record a new search term. Restarts the quiet period; an earlier
    /// pending term is dropped. Must be called inside a tokio runtime.
    pub fn set_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        self.cancel_pending();

        let delay = self.effective_delay();
        if delay.is_zero() {
            publish(&self.sender, term);
            return;
        }

        let sender = Arc::clone(&self.sender);
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            publish(&sender, term);
        }));
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}

impl Drop for DebouncedQuery {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

/// Publish only real changes, so an unchanged key never refetches
fn publish(sender: &watch::Sender<QueryKey>, term: String) {
    let changed = sender.send_if_modified(|key| {
        if key.term == term {
            false
        } else {
            key.term = term;
            true
        }
    });
    if changed {
        trace!(key = %*sender.borrow(), "Query key published");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_key_is_immediate() {
        let query = DebouncedQuery::new("rooms", "", DEFAULT_DEBOUNCE);
        let rx = query.subscribe();
        assert_eq!(*rx.borrow(), QueryKey::new("rooms", ""));
        assert_eq!(query.current(), QueryKey::new("rooms", ""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_preloading_skips_delay() {
        let mut query = DebouncedQuery::new("rooms", "", DEFAULT_DEBOUNCE);
        let mut rx = query.subscribe();

        assert_eq!(query.effective_delay(), Duration::ZERO);
        query.set_term("Room");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().term, "Room");
        assert!(!query.has_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mounted_term_waits_for_quiet_period() {
        let mut query = DebouncedQuery::new("rooms", "", DEFAULT_DEBOUNCE);
        query.mark_mounted();
        let mut rx = query.subscribe();

        query.set_term("Room A");
        tokio::time::sleep(ms(299)).await;
        assert!(!rx.has_changed().unwrap());
        assert!(query.has_pending());

        tokio::time::sleep(ms(2)).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().term, "Room A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_keystrokes_publish_once() {
        let mut query = DebouncedQuery::new("rooms", "", DEFAULT_DEBOUNCE);
        query.mark_mounted();
        let mut rx = query.subscribe();

        for term in ["R", "Ro", "Roo", "Room", "Room A"] {
            query.set_term(term);
            tokio::time::sleep(ms(20)).await;
        }
        assert!(!rx.has_changed().unwrap());

        tokio::time::sleep(DEFAULT_DEBOUNCE).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().term, "Room A");

        tokio::time::sleep(ms(1000)).await;
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_returning_to_same_term_publishes_nothing() {
        let mut query = DebouncedQuery::new("rooms", "Room", DEFAULT_DEBOUNCE);
        query.mark_mounted();
        let rx = query.subscribe();

        query.set_term("Room A");
        tokio::time::sleep(ms(100)).await;
        query.set_term("Room");
        tokio::time::sleep(ms(500)).await;

        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_timer() {
        let mut query = DebouncedQuery::new("rooms", "", DEFAULT_DEBOUNCE);
        query.mark_mounted();
        let rx = query.subscribe();

        query.set_term("Room A");
        drop(query);
        tokio::time::sleep(ms(1000)).await;

        assert_eq!(rx.borrow().term, "");
    }
}
