//! Query identity and per-binding fetch options

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::shared::DEFAULT_PAGE_SIZE;

/// Identity of a logical query: resource name plus the (debounced) search term.
///
/// Two equal keys are the same query; a key change discards accumulated pages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    pub resource: String,
    pub term: String,
}

impl QueryKey {
    pub fn new(resource: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            term: term.into(),
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?})", self.resource, self.term)
    }
}

/// Fixed options of one binding: everything in a request except page and keyword
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub page_size: u32,
    pub sort_column: String,
    pub descending: bool,
    #[serde(default)]
    pub filters: Vec<(String, String)>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            sort_column: "id".to_string(),
            descending: false,
            filters: Vec::new(),
        }
    }
}

impl QueryOptions {
    pub fn sorted_by(mut self, column: impl Into<String>, descending: bool) -> Self {
        self.sort_column = column.into();
        self.descending = descending;
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Add a filter; calling twice with the same key yields a multi-valued filter
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((key.into(), value.into()));
        self
    }
}
