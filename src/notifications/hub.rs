//! Notification hub service
//!
//! An explicitly constructed, injected service: at most one live hub
//! connection per instance, started and torn down by its owner. Inbound
//! frames land on the [`EventBus`]; consumers hold an [`EventSubscriber`].

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::event_bus::{EventSubscriber, SharedEventBus};
use super::events::{HubMessage, TOPIC_HUB_CONNECTED, TOPIC_HUB_DISCONNECTED};
use crate::domain::HubConnector;
use crate::shared::{retry_with_backoff, HubError, RetryConfig, ShutdownSignal};

struct RunningHub {
    shutdown: ShutdownSignal,
    task: JoinHandle<()>,
}

pub struct NotificationHub {
    bus: SharedEventBus,
    connector: Arc<dyn HubConnector>,
    retry: RetryConfig,
    running: Mutex<Option<RunningHub>>,
}

impl NotificationHub {
    pub fn new(bus: SharedEventBus, connector: Arc<dyn HubConnector>, retry: RetryConfig) -> Self {
        Self {
            bus,
            connector,
            retry,
            running: Mutex::new(None),
        }
    }

    /// Start the reader task. Returns `false` if one is already running.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if let Some(current) = running.as_ref() {
            if !current.task.is_finished() {
                debug!("Notification hub already running");
                return false;
            }
        }

        let shutdown = ShutdownSignal::new();
        let task = tokio::spawn(run_reader(
            self.connector.clone(),
            self.bus.clone(),
            self.retry.clone(),
            shutdown.clone(),
        ));

        *running = Some(RunningHub { shutdown, task });
        info!("Notification hub started");
        true
    }

    /// Stop the reader and wait for it to close its connection
    pub async fn shutdown(&self) {
        let Some(hub) = self.running.lock().await.take() else {
            return;
        };

        hub.shutdown.trigger();
        if let Err(e) = hub.task.await {
            error!(error = %e, "Notification hub reader panicked");
        }
        info!("Notification hub stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|hub| !hub.task.is_finished())
    }

    pub fn subscribe(&self) -> EventSubscriber {
        self.bus.subscribe()
    }

    pub fn subscribe_topics<I, S>(&self, topics: I) -> EventSubscriber
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bus.subscribe_topics(topics)
    }

    pub fn bus(&self) -> &SharedEventBus {
        &self.bus
    }
}

async fn run_reader(
    connector: Arc<dyn HubConnector>,
    bus: SharedEventBus,
    retry: RetryConfig,
    shutdown: ShutdownSignal,
) {
    loop {
        let connect = retry_with_backoff(
            retry.clone(),
            || connector.connect(),
            |_: &HubError| true,
            "hub_connect",
        );

        let mut transport = tokio::select! {
            result = connect => match result {
                Ok(transport) => transport,
                Err(e) => {
                    error!(error = %e, "Notification hub unreachable, giving up");
                    bus.publish(HubMessage::hub_status(TOPIC_HUB_DISCONNECTED, Some(e.to_string())));
                    break;
                }
            },
            _ = shutdown.wait() => break,
        };

        bus.publish(HubMessage::hub_status(TOPIC_HUB_CONNECTED, None));

        let lost = loop {
            tokio::select! {
                frame = transport.next_frame() => match frame {
                    Some(Ok(text)) => match HubMessage::parse(&text) {
                        Ok(message) => bus.publish(message),
                        Err(e) => warn!(error = %e, "Dropping malformed hub frame"),
                    },
                    Some(Err(e)) => break Some(e.to_string()),
                    None => break Some("closed by server".to_string()),
                },
                _ = shutdown.wait() => break None,
            }
        };

        transport.close().await;

        let Some(reason) = lost else {
            break;
        };

        warn!(reason, "Notification hub connection lost, reconnecting");
        bus.publish(HubMessage::hub_status(TOPIC_HUB_DISCONNECTED, Some(reason)));

        tokio::select! {
            _ = tokio::time::sleep(retry.initial_delay) => {}
            _ = shutdown.wait() => break,
        }
    }

    info!("Notification hub reader stopped");
}
