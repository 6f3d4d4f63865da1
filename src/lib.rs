//! # Piano Admin Client
//!
//! Client-side data layer for the piano-school administration backend:
//! paged collection fetches, debounced search, infinite-scroll
//! accumulation, row selection and the real-time notification hub.
//!
//! ## Architecture
//!
//! - **domain**: Query identity, entities and the ports adapters implement
//! - **application**: Debounce, accumulator, infinite query, table and selection
//! - **infrastructure**: REST client (`reqwest`) and hub WebSocket (`tokio-tungstenite`)
//! - **notifications**: Event bus and the notification hub service
//! - **runtime**: [`ClientHandle`] wiring it all from an [`AppConfig`]
//! - **shared**: Pagination types, errors, retry and shutdown helpers

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod runtime;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{PagedTable, QueryBinding, SelectionSet};
pub use domain::{QueryKey, QueryOptions};
pub use runtime::{init_tracing, ClientHandle, ClientOptions};
pub use shared::{FetchError, PageMetadata, PageRequest, PagedResult};

// Re-export notifications
pub use notifications::{create_event_bus, EventBus, NotificationHub, SharedEventBus};
