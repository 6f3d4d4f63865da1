//! Notifications module
//!
//! Real-time messages pushed by the school backend (enrollment changes,
//! lesson moves, refund requests) delivered to in-process subscribers.
//!
//! # Usage
//! ```ignore
//! use std::sync::Arc;
//! use piano_admin::infrastructure::WsConnector;
//! use piano_admin::notifications::{create_event_bus, NotificationHub};
//!
//! let hub = NotificationHub::new(
//!     create_event_bus(),
//!     Arc::new(WsConnector::new("ws://localhost:5000/hub", tokens)),
//!     RetryConfig::default(),
//! );
//! hub.start().await;
//! let mut lessons = hub.subscribe_topics(["lesson.moved"]);
//! while let Some(event) = lessons.recv().await { /* ... */ }
//! hub.shutdown().await;
//! ```

pub mod event_bus;
pub mod events;
pub mod hub;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;
pub use hub::NotificationHub;
