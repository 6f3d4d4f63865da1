//! Incremental page accumulator
//!
//! Append-only cache of the pages fetched for one query key. The
//! accumulator is a plain state machine; it never performs I/O. Callers take
//! a [`PageTicket`], fetch, and hand the result back through
//! [`PageAccumulator::apply`], which drops anything issued under an older key.
//!
//! ```text
//! Idle ──ticket──▶ Loading(1) ──ok──▶ Loaded ──ticket──▶ Loading(n+1) ──ok──▶ Loaded
//!                      │                                     │
//!                      └──────────err──────▶ Failed(n) ◀─────┘
//! any state ──key change──▶ Idle (new generation)
//! ```

use std::collections::BTreeSet;

use crate::domain::QueryKey;
use crate::shared::{FetchError, FetchResult, PagedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading { page: u32 },
    Loaded,
    Failed { page: u32 },
}

/// Permission to fetch one page for one key generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    pub key: QueryKey,
    pub generation: u64,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Appended { page: u32, received: usize },
    Failed(FetchError),
    /// Response for a superseded key or ticket; discarded
    Stale,
}

pub struct PageAccumulator<T> {
    key: QueryKey,
    generation: u64,
    pages: Vec<PagedResult<T>>,
    fetched: BTreeSet<u32>,
    state: LoadState,
    error: Option<FetchError>,
}

impl<T> PageAccumulator<T> {
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            generation: 0,
            pages: Vec::new(),
            fetched: BTreeSet::new(),
            state: LoadState::Idle,
            error: None,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// Switch to `key`, discarding all pages. No-op (returns `false`) when
    /// the key is unchanged.
    pub fn reset(&mut self, key: QueryKey) -> bool {
        if key == self.key {
            return false;
        }
        self.key = key;
        self.invalidate();
        true
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.pages.clear();
        self.fetched.clear();
        self.state = LoadState::Idle;
        self.error = None;
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading { .. })
    }

    /// True until a page reports itself as the last one. Nothing loaded yet
    /// counts as "more".
    pub fn has_more(&self) -> bool {
        self.pages
            .last()
            .map_or(true, |last| last.metadata.has_more())
    }

    /// Page the next ticket would fetch, if any
    pub fn next_page(&self) -> Option<u32> {
        let page = match self.pages.last() {
            None => 1,
            Some(last) if last.metadata.has_more() => last.metadata.next_page(),
            Some(_) => return None,
        };
        (!self.fetched.contains(&page)).then_some(page)
    }

    /// Claim the next page. `None` while a fetch is in flight, once the
    /// last page is loaded, or if the server's metadata points back at a
    /// page already fetched under this key.
    pub fn next_ticket(&mut self) -> Option<PageTicket> {
        if self.is_loading() {
            return None;
        }
        let page = self.next_page()?;
        self.state = LoadState::Loading { page };
        Some(PageTicket {
            key: self.key.clone(),
            generation: self.generation,
            page,
        })
    }

    /// Claim page 1 only. `None` once any page is loaded for this key, so an
    /// automatic load never runs ahead of the user's scroll position.
    pub fn first_ticket(&mut self) -> Option<PageTicket> {
        if !self.pages.is_empty() {
            return None;
        }
        self.next_ticket()
    }

    /// Merge the outcome of a ticketed fetch.
    ///
    /// Failures keep every page already loaded; the same page is offered
    /// again by the next ticket.
    pub fn apply(&mut self, ticket: &PageTicket, result: FetchResult<PagedResult<T>>) -> ApplyOutcome {
        let current = ticket.generation == self.generation
            && ticket.key == self.key
            && self.state == LoadState::Loading { page: ticket.page };
        if !current {
            return ApplyOutcome::Stale;
        }

        match result {
            Ok(page) => {
                let received = page.items.len();
                self.fetched.insert(ticket.page);
                self.pages.push(page);
                self.state = LoadState::Loaded;
                self.error = None;
                ApplyOutcome::Appended {
                    page: ticket.page,
                    received,
                }
            }
            Err(err) => {
                self.state = LoadState::Failed { page: ticket.page };
                self.error = Some(err.clone());
                ApplyOutcome::Failed(err)
            }
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn pages(&self) -> &[PagedResult<T>] {
        &self.pages
    }

    /// Flattened view, in fetch order
    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.pages.iter().flat_map(|page| page.items.iter())
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(PagedResult::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Server-reported total, once any page has arrived
    pub fn total_count(&self) -> Option<u64> {
        self.pages.last().map(|page| page.metadata.total_count)
    }
}

/// Owned copy of the accumulator for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorSnapshot<T> {
    pub key: QueryKey,
    pub items: Vec<T>,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<FetchError>,
    pub total_count: Option<u64>,
    pub pages_loaded: usize,
}

impl<T: Clone> PageAccumulator<T> {
    pub fn snapshot(&self) -> AccumulatorSnapshot<T> {
        AccumulatorSnapshot {
            key: self.key.clone(),
            items: self.items().cloned().collect(),
            has_more: self.has_more(),
            loading: self.is_loading(),
            error: self.error.clone(),
            total_count: self.total_count(),
            pages_loaded: self.pages.len(),
        }
    }
}
