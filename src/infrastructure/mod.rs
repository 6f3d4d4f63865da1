//! Infrastructure layer
//!
//! Adapters for the outside world: the backend REST API and the
//! notification hub WebSocket.

pub mod http;
pub mod hub;

pub use http::{ApiClient, ResourceSource, StaticToken};
pub use hub::WsConnector;
