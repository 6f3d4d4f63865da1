//! One list binding (combobox, dialog, multi-select): debounced search,
//! infinite scroll and a selection, owned together and torn down together.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::accumulator::AccumulatorSnapshot;
use super::debounce::DebouncedQuery;
use super::infinite::{InfiniteQuery, LoadOutcome, Viewport};
use crate::application::selection::SelectionSet;
use crate::domain::{Identified, PageSource, QueryKey, QueryOptions};

pub struct QueryBinding<T> {
    search: DebouncedQuery,
    query: Arc<InfiniteQuery<T>>,
    selection: SelectionSet,
    follower: JoinHandle<()>,
}

impl<T> QueryBinding<T>
where
    T: Identified + Clone + Send + 'static,
{
    /// Bind `source` and start loading page 1 for `initial_term` right away.
    /// Later searches wait out the debounce window. Must be called inside a
    /// tokio runtime.
    pub fn new(
        source: Arc<dyn PageSource<T>>,
        initial_term: impl Into<String>,
        options: QueryOptions,
        debounce: Duration,
    ) -> Self {
        let mut search = DebouncedQuery::new(source.resource().to_string(), initial_term, debounce);
        let query = Arc::new(InfiniteQuery::new(source, search.current(), options));
        let follower = Arc::clone(&query).follow(search.subscribe());
        // Initial key is already published
        search.mark_mounted();

        Self {
            search,
            query,
            selection: SelectionSet::new(),
            follower,
        }
    }

    pub fn search(&mut self, term: impl Into<String>) {
        self.search.set_term(term);
    }

    pub fn key(&self) -> QueryKey {
        self.search.current()
    }

    pub async fn on_scroll(&self, viewport: Viewport) -> LoadOutcome {
        self.query.on_scroll(viewport).await
    }

    /// Retry after a failure, or fetch more without a scroll event
    pub async fn load_next(&self) -> LoadOutcome {
        self.query.load_next().await
    }

    pub async fn snapshot(&self) -> AccumulatorSnapshot<T> {
        self.query.snapshot().await
    }

    pub fn query(&self) -> &Arc<InfiniteQuery<T>> {
        &self.query
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    pub fn toggle(&mut self, item: &T) -> bool {
        self.selection.toggle_item(item)
    }

    /// Select every row loaded so far
    pub async fn select_loaded(&mut self) {
        let snapshot = self.query.snapshot().await;
        self.selection.select_all_items(&snapshot.items);
    }

    /// Dialog closed: loading stops and the selection is handed back
    pub fn close(mut self) -> SelectionSet {
        std::mem::take(&mut self.selection)
    }
}

impl<T> Drop for QueryBinding<T> {
    fn drop(&mut self) {
        self.follower.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::query::debounce::DEFAULT_DEBOUNCE;
    use crate::application::query::test_support::{RangeSource, Row};

    fn bottom() -> Viewport {
        Viewport::new(600.0, 400.0, 1000.0)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_survives_paging() {
        let source = Arc::new(RangeSource::new("students", 25));
        let mut binding =
            QueryBinding::<Row>::new(source.clone(), "", QueryOptions::default(), DEFAULT_DEBOUNCE);
        settle().await;

        let first = binding.snapshot().await;
        assert_eq!(first.items.len(), 10);
        let picked = first.items[4].clone();
        assert!(binding.toggle(&picked));

        assert_eq!(
            binding.on_scroll(bottom()).await,
            LoadOutcome::Appended { page: 2, received: 10 }
        );
        assert!(binding.selection().is_item_selected(&picked));
        assert_eq!(binding.selection().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_survives_search_and_is_returned_on_close() {
        let source = Arc::new(RangeSource::new("students", 25));
        let mut binding =
            QueryBinding::<Row>::new(source.clone(), "", QueryOptions::default(), DEFAULT_DEBOUNCE);
        settle().await;

        binding.select_loaded().await;
        assert_eq!(binding.selection().len(), 10);

        binding.search("mei");
        tokio::time::sleep(Duration::from_millis(400)).await;

        let snap = binding.snapshot().await;
        assert_eq!(snap.key, QueryKey::new("students", "mei"));
        assert!(snap.items.iter().all(|row| row.term == "mei"));
        assert_eq!(binding.selection().len(), 10);
        assert!(binding.selection().can_confirm());

        let selected = binding.close();
        assert_eq!(selected.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_after_bind_is_debounced() {
        let source = Arc::new(RangeSource::new("rooms", 25));
        let mut binding =
            QueryBinding::<Row>::new(source.clone(), "", QueryOptions::default(), DEFAULT_DEBOUNCE);
        settle().await;
        assert_eq!(source.request_count(), 1);

        for term in ["R", "Ro", "Roo", "Room", "Room A"] {
            binding.search(term);
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;

        let keywords: Vec<Option<String>> =
            source.requests().into_iter().map(|r| r.keyword).collect();
        assert_eq!(keywords, [None, Some("Room A".to_string())]);
        assert_eq!(binding.key(), QueryKey::new("rooms", "Room A"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_following() {
        let source = Arc::new(RangeSource::new("rooms", 25));
        let mut binding =
            QueryBinding::<Row>::new(source.clone(), "", QueryOptions::default(), DEFAULT_DEBOUNCE);
        settle().await;

        binding.search("Room A");
        drop(binding);
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(source.request_count(), 1);
    }
}
