//! Server-paginated data table
//!
//! Unlike the infinite list, the table shows one page at a time and replaces
//! it on navigation. Every navigation, sort or filter change bumps a
//! generation; a response issued under an older generation is dropped.

use tracing::{debug, warn};

use crate::domain::{PageSource, QueryOptions};
use crate::shared::{FetchError, FetchResult, PageMetadata, PageRequest, PagedResult};

/// A request issued by [`PagedTable::begin`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTicket {
    pub generation: u64,
    pub request: PageRequest,
}

pub struct PagedTable<T> {
    options: QueryOptions,
    page: u32,
    keyword: String,
    generation: u64,
    current: Option<PagedResult<T>>,
    loading: bool,
    error: Option<FetchError>,
}

impl<T> PagedTable<T> {
    pub fn new(options: QueryOptions) -> Self {
        Self {
            options,
            page: 1,
            keyword: String::new(),
            generation: 0,
            current: None,
            loading: false,
            error: None,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Metadata of the page on screen, defaults before the first load
    pub fn metadata(&self) -> PageMetadata {
        self.current
            .as_ref()
            .map_or_else(PageMetadata::default, |page| page.metadata)
    }

    pub fn rows(&self) -> &[T] {
        self.current.as_ref().map_or(&[], |page| page.items.as_slice())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    /// Jump to `page`, clamped to the known page range. Returns whether the
    /// page changed.
    pub fn goto(&mut self, page: u32) -> bool {
        let last = self
            .current
            .as_ref()
            .map_or(u32::MAX, |current| current.metadata.total_pages.max(1));
        let page = page.clamp(1, last);
        if page == self.page {
            return false;
        }
        self.page = page;
        self.bump();
        true
    }

    pub fn next(&mut self) -> bool {
        if !self.metadata().has_more() && self.current.is_some() {
            return false;
        }
        self.goto(self.page.saturating_add(1))
    }

    pub fn prev(&mut self) -> bool {
        self.goto(self.page.saturating_sub(1))
    }

    /// Change rows per page; always returns to page 1
    pub fn set_page_size(&mut self, size: u32) {
        self.options.page_size = size.max(1);
        self.page = 1;
        self.bump();
    }

    /// Sort by `column`. Clicking the active column flips the direction; a
    /// new column starts ascending.
    pub fn sort_by(&mut self, column: impl Into<String>) {
        let column = column.into();
        if self.options.sort_column == column {
            self.options.descending = !self.options.descending;
        } else {
            self.options.sort_column = column;
            self.options.descending = false;
        }
        self.bump();
    }

    /// Change the search keyword; returns to page 1
    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        let keyword = keyword.into();
        if keyword == self.keyword {
            return;
        }
        self.keyword = keyword;
        self.page = 1;
        self.bump();
    }

    fn bump(&mut self) {
        self.generation += 1;
        self.loading = false;
    }

    /// Request for the current page, sort and keyword
    pub fn begin(&mut self) -> TableTicket {
        self.loading = true;
        TableTicket {
            generation: self.generation,
            request: PageRequest::first(&self.options, &self.keyword).with_page(self.page),
        }
    }

    /// Install a response. Returns `false` for a superseded ticket; the
    /// table is left untouched in that case.
    pub fn apply(&mut self, ticket: &TableTicket, result: FetchResult<PagedResult<T>>) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Discarding stale table page"
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(page) => {
                self.current = Some(page);
                self.error = None;
            }
            Err(err) => {
                warn!(page = ticket.request.page, error = %err, "Table page fetch failed");
                self.error = Some(err);
            }
        }
        true
    }

    /// Fetch and install the current page in one step
    pub async fn load(&mut self, source: &dyn PageSource<T>) -> bool {
        let ticket = self.begin();
        let result = source.fetch_page(&ticket.request).await;
        self.apply(&ticket, result)
    }
}
