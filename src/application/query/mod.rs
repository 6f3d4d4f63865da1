//! Paged query core
//!
//! Data flow for one list binding: search term → [`DebouncedQuery`] key →
//! [`InfiniteQuery`] issues a [`PageRequest`](crate::shared::PageRequest)
//! through a [`PageSource`](crate::domain::PageSource) → the response lands
//! in the [`PageAccumulator`] → the front end renders a snapshot.

pub mod accumulator;
pub mod binding;
pub mod debounce;
pub mod infinite;
pub mod inflight;

#[cfg(test)]
pub(crate) mod test_support;

pub use accumulator::{AccumulatorSnapshot, ApplyOutcome, LoadState, PageAccumulator, PageTicket};
pub use binding::QueryBinding;
pub use debounce::DebouncedQuery;
pub use infinite::{InfiniteQuery, LoadOutcome, Viewport};
pub use inflight::DedupSource;
