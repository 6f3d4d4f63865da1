//! Notification hub messages
//!
//! The hub speaks one canonical frame shape: `{"topic": "...", "payload": ...}`.
//! The hub itself also publishes local `hub.*` status messages on the bus.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::shared::HubError;

/// Published by the hub after each successful connect
pub const TOPIC_HUB_CONNECTED: &str = "hub.connected";
/// Published by the hub when a connection is lost or cannot be established
pub const TOPIC_HUB_DISCONNECTED: &str = "hub.disconnected";

/// One inbound hub message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMessage {
    pub topic: String,
    #[serde(default)]
    pub payload: Value,
}

impl HubMessage {
    pub fn new(topic: impl Into<String>, payload: Value) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Parse a text frame. Frames without a non-empty `topic` are rejected.
    pub fn parse(frame: &str) -> Result<Self, HubError> {
        let value: Value =
            serde_json::from_str(frame).map_err(|e| HubError::Decode(e.to_string()))?;
        if !value.is_object() {
            return Err(HubError::Decode("frame is not a JSON object".to_string()));
        }
        let message: Self =
            serde_json::from_value(value).map_err(|e| HubError::Decode(e.to_string()))?;
        if message.topic.trim().is_empty() {
            return Err(HubError::Decode("empty topic".to_string()));
        }
        Ok(message)
    }

    pub(crate) fn hub_status(topic: &str, reason: Option<String>) -> Self {
        let payload = match reason {
            Some(reason) => serde_json::json!({ "reason": reason }),
            None => Value::Null,
        };
        Self::new(topic, payload)
    }

    /// Whether this is one of the hub's own status messages
    pub fn is_hub_status(&self) -> bool {
        self.topic.starts_with("hub.")
    }
}

/// Wrapper delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    #[serde(flatten)]
    pub message: HubMessage,
}

impl EventMessage {
    pub fn new(message: HubMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            received_at: Utc::now(),
            message,
        }
    }

    pub fn topic(&self) -> &str {
        &self.message.topic
    }
}
