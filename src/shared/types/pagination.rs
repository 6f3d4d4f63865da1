//! Paged fetch contract
//!
//! Normalized request/response shapes for every collection endpoint. The
//! request travels as query parameters, the pagination metadata comes back
//! in response headers rather than the body.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::QueryOptions;

pub const HEADER_PAGE: &str = "x-page";
pub const HEADER_PAGE_SIZE: &str = "x-page-size";
pub const HEADER_TOTAL_PAGES: &str = "x-total-pages";
pub const HEADER_TOTAL_COUNT: &str = "x-total-count";

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_TOTAL_PAGES: u32 = 1;
pub const DEFAULT_TOTAL_COUNT: u64 = 0;

/// One bounded slice request against a collection endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct PageRequest {
    /// Page number (1-based)
    #[validate(range(min = 1))]
    pub page: u32,
    /// Items per page
    #[validate(range(min = 1))]
    pub page_size: u32,
    /// Backend field name to sort by (not checked client-side)
    pub sort_column: String,
    pub descending: bool,
    /// Free-text filter. `None` means no filter
    pub keyword: Option<String>,
    /// Extra `key=value` filters; a key may repeat for multi-valued filters
    #[serde(default)]
    pub filters: Vec<(String, String)>,
}

impl PageRequest {
    /// Request for page 1 using the binding's options and search term
    pub fn first(options: &QueryOptions, keyword: &str) -> Self {
        let keyword = keyword.trim();
        Self {
            page: DEFAULT_PAGE,
            page_size: options.page_size,
            sort_column: options.sort_column.clone(),
            descending: options.descending,
            keyword: (!keyword.is_empty()).then(|| keyword.to_string()),
            filters: options.filters.clone(),
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Query string pairs in wire order: `page, size, column, desc, [q], [filters]*`
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.page_size.to_string()),
            ("column".to_string(), self.sort_column.clone()),
            ("desc".to_string(), self.descending.to_string()),
        ];

        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            pairs.push(("q".to_string(), keyword.to_string()));
        }

        pairs.extend(self.filters.iter().cloned());
        pairs
    }
}

/// Pagination metadata read from response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

impl Default for PageMetadata {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            total_pages: DEFAULT_TOTAL_PAGES,
            total_count: DEFAULT_TOTAL_COUNT,
        }
    }
}

impl PageMetadata {
    /// Parse the `x-page*` / `x-total-*` headers.
    ///
    /// Never fails: any header that is missing, non-numeric or out of range
    /// falls back to its default. A reported page past the last page is
    /// clamped to `max(total_pages, 1)`.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let page = header_number::<u32>(headers, HEADER_PAGE)
            .filter(|p| *p >= 1)
            .unwrap_or(DEFAULT_PAGE);
        let page_size = header_number::<u32>(headers, HEADER_PAGE_SIZE)
            .filter(|s| *s >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let total_pages =
            header_number::<u32>(headers, HEADER_TOTAL_PAGES).unwrap_or(DEFAULT_TOTAL_PAGES);
        let total_count =
            header_number::<u64>(headers, HEADER_TOTAL_COUNT).unwrap_or(DEFAULT_TOTAL_COUNT);

        Self {
            page: page.min(total_pages.max(1)),
            page_size,
            total_pages,
            total_count,
        }
    }

    /// Whether the server has a page after this one
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn next_page(&self) -> u32 {
        self.page + 1
    }
}

fn header_number<N: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<N> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<N>().ok())
}

/// One page of items plus its metadata. Built per response, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub metadata: PageMetadata,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, metadata: PageMetadata) -> Self {
        Self { items, metadata }
    }

    /// Build a page the way a server would report it, for `total` items overall
    pub fn slice(items: Vec<T>, page: u32, page_size: u32, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(page_size.max(1))) as u32;
        Self {
            items,
            metadata: PageMetadata {
                page,
                page_size,
                total_pages,
                total_count: total,
            },
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
