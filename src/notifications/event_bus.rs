//! Event Bus for broadcasting hub messages to subscribers
//!
//! Uses tokio broadcast channel for pub/sub pattern.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::events::{EventMessage, HubMessage};

/// Default channel capacity
const DEFAULT_CAPACITY: usize = 256;

/// Event bus for broadcasting hub messages to all subscribers
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventBus {
    /// Create a new event bus with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new event bus with custom capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriber_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Publish a message to all subscribers
    pub fn publish(&self, message: HubMessage) {
        let message = EventMessage::new(message);
        let topic = message.topic().to_string();

        match self.sender.send(message) {
            Ok(count) => debug!(topic, subscribers = count, "Hub message published"),
            // No subscribers is normal when nothing is listening yet
            Err(_) => debug!(topic, "Hub message published (no subscribers)"),
        }
    }

    /// Subscribe to every message
    pub fn subscribe(&self) -> EventSubscriber {
        self.subscribe_inner(None)
    }

    /// Subscribe to messages whose topic is in `topics`
    pub fn subscribe_topics<I, S>(&self, topics: I) -> EventSubscriber
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscribe_inner(Some(topics.into_iter().map(Into::into).collect()))
    }

    fn subscribe_inner(&self, topics: Option<Vec<String>>) -> EventSubscriber {
        let receiver = self.sender.subscribe();
        let count = self.subscriber_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(subscribers = count, "New hub subscriber");

        EventSubscriber {
            receiver,
            topics,
            subscriber_count: self.subscriber_count.clone(),
        }
    }

    /// Get current subscriber count
    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellable subscription: dropping it unsubscribes
pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
    topics: Option<Vec<String>>,
    subscriber_count: Arc<AtomicUsize>,
}

impl EventSubscriber {
    /// Receive the next matching message; `None` once the bus is gone
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(msg) if self.matches(&msg) => return Some(msg),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(missed = count, "Hub subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn matches(&self, msg: &EventMessage) -> bool {
        match &self.topics {
            Some(topics) => topics.iter().any(|t| t == msg.topic()),
            None => true,
        }
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        let prev = self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        debug!(remaining = prev.saturating_sub(1), "Hub subscriber dropped");
    }
}

/// Shared event bus type
pub type SharedEventBus = Arc<EventBus>;

/// Create a shared event bus
pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::new();
        let mut subscriber = bus.subscribe();

        bus.publish(HubMessage::new("class.updated", json!({"id": 3})));

        let received = tokio::time::timeout(Duration::from_millis(100), subscriber.recv())
            .await
            .expect("Timeout")
            .expect("No message");

        assert_eq!(received.topic(), "class.updated");
        assert_eq!(received.message.payload["id"], 3);
    }

    #[tokio::test]
    async fn test_topic_filter_skips_other_topics() {
        let bus = EventBus::new();
        let mut refunds = bus.subscribe_topics(["refund.requested"]);

        bus.publish(HubMessage::new("class.updated", json!(null)));
        bus.publish(HubMessage::new("refund.requested", json!({"amount": 120})));

        let received = tokio::time::timeout(Duration::from_millis(100), refunds.recv())
            .await
            .expect("Timeout")
            .expect("No message");
        assert_eq!(received.topic(), "refund.requested");
    }

    #[test]
    fn test_subscriber_count() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let sub1 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _sub2 = bus.subscribe_topics(["a"]);
        assert_eq!(bus.subscriber_count(), 2);

        drop(sub1);
        assert_eq!(bus.subscriber_count(), 1);
    }
}
