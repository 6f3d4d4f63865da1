//! Outbound ports: interfaces the query layer calls out through
//!
//! The HTTP client implements these for the real backend; tests and
//! embedding front ends can plug in their own sources.

use async_trait::async_trait;

use crate::shared::{FetchResult, HubError, PageRequest, PagedResult};

// ── PageSource ─────────────────────────────────────────────────

/// Source of paged collection data for one resource.
///
/// One call is one network request. Implementations must not retry;
/// retry policy belongs to the caller.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> FetchResult<PagedResult<T>>;

    /// Logical resource name, used for logging and dedup identity
    fn resource(&self) -> &str;
}

// ── TokenProvider ──────────────────────────────────────────────

/// Supplies the bearer token attached to every request.
///
/// Session refresh is the provider's concern, not the client's.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// `Ok(None)` sends the request without an `Authorization` header.
    async fn bearer_token(&self) -> FetchResult<Option<String>>;
}

// ── Notification hub ───────────────────────────────────────────

/// One live connection to the notification hub
#[async_trait]
pub trait HubTransport: Send {
    /// Next inbound text frame; `None` once the peer has closed
    async fn next_frame(&mut self) -> Option<Result<String, HubError>>;

    async fn close(&mut self);
}

/// Opens hub connections. The hub calls this again after a disconnect.
#[async_trait]
pub trait HubConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn HubTransport>, HubError>;
}
