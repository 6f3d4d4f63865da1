//! Client runtime
//!
//! [`ClientHandle`] wires the configured API client, event bus and
//! notification hub together and hands out list bindings. Front ends (the
//! CLI, a desktop shell) build one handle at startup and call
//! [`ClientHandle::shutdown`] on exit.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::application::{DedupSource, PagedTable, QueryBinding};
use crate::config::AppConfig;
use crate::domain::{Identified, PageSource, TokenProvider};
use crate::infrastructure::{ApiClient, StaticToken, WsConnector};
use crate::notifications::{create_event_bus, EventSubscriber, NotificationHub, SharedEventBus};
use crate::shared::AppError;

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the client runtime.
pub struct ClientOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Token source; defaults to the static `[api].token`.
    pub tokens: Option<Arc<dyn TokenProvider>>,
    /// Connect to the notification hub when `[hub].url` is set (default: true).
    pub start_hub: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            tokens: None,
            start_hub: true,
        }
    }
}

impl From<AppConfig> for ClientOptions {
    fn from(config: AppConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }
}

// ── ClientHandle ───────────────────────────────────────────────────

/// Handle to a configured client.
///
/// ```rust,no_run
/// use piano_admin::runtime::{ClientHandle, ClientOptions};
/// use piano_admin::domain::Room;
///
/// #[tokio::main]
/// async fn main() -> Result<(), piano_admin::shared::AppError> {
///     let client = ClientHandle::start(ClientOptions::default()).await?;
///     let rooms = client.bind::<Room>("rooms", "");
///     // ... render rooms.snapshot().await ...
///     drop(rooms);
///     client.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ClientHandle {
    /// REST client shared by every binding.
    pub api: Arc<ApiClient>,
    /// Inbound hub messages.
    pub event_bus: SharedEventBus,
    /// The configuration the client was started with.
    pub config: AppConfig,

    hub: Option<NotificationHub>,
}

impl ClientHandle {
    /// Build the API client and, if configured, start the notification hub.
    pub async fn start(opts: ClientOptions) -> Result<Self, AppError> {
        let config = opts.config;
        config.validate()?;

        let tokens = opts
            .tokens
            .unwrap_or_else(|| Arc::new(StaticToken::from_option(config.api.token.clone())));

        let api = Arc::new(ApiClient::new(
            config.api.base_url.clone(),
            config.api.timeout(),
            Arc::clone(&tokens),
        )?);
        info!(base_url = api.base_url(), "API client ready");

        let event_bus = create_event_bus();

        let hub = match (&config.hub.url, opts.start_hub) {
            (Some(url), true) => {
                let connector = Arc::new(WsConnector::new(url.clone(), tokens));
                let hub = NotificationHub::new(event_bus.clone(), connector, config.hub.retry());
                hub.start().await;
                Some(hub)
            }
            _ => None,
        };

        Ok(Self {
            api,
            event_bus,
            config,
            hub,
        })
    }

    /// Raw page source for `resource`
    pub fn source<T>(&self, resource: &str) -> Arc<dyn PageSource<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        Arc::new(self.api.resource::<T>(resource))
    }

    /// Page source that shares identical in-flight requests between callers
    pub fn shared_source<T>(&self, resource: &str) -> Arc<dyn PageSource<T>>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        Arc::new(DedupSource::new(self.source::<T>(resource)))
    }

    /// Infinite-scroll binding using the configured query defaults.
    /// Page 1 starts loading immediately.
    pub fn bind<T>(&self, resource: &str, initial_term: &str) -> QueryBinding<T>
    where
        T: DeserializeOwned + Identified + Clone + Send + 'static,
    {
        QueryBinding::new(
            self.source(resource),
            initial_term,
            self.config.query.options(),
            self.config.query.debounce(),
        )
    }

    pub fn table<T>(&self) -> PagedTable<T> {
        PagedTable::new(self.config.query.options())
    }

    pub fn hub(&self) -> Option<&NotificationHub> {
        self.hub.as_ref()
    }

    pub fn subscribe(&self) -> EventSubscriber {
        self.event_bus.subscribe()
    }

    /// Stop the notification hub and release the client.
    pub async fn shutdown(self) {
        info!("Shutting down client...");
        if let Some(hub) = &self.hub {
            hub.shutdown().await;
        }
        info!("Client stopped");
    }
}

/// Initialize tracing (logging) from the application config.
///
/// `RUST_LOG` overrides `[logging].level`. Call once at process startup.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Room;
    use axum::http::HeaderMap;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::time::Duration;

    async fn rooms() -> impl IntoResponse {
        let mut headers = HeaderMap::new();
        headers.insert("x-page", "1".parse().unwrap());
        headers.insert("x-total-pages", "1".parse().unwrap());
        headers.insert("x-total-count", "2".parse().unwrap());
        (
            headers,
            Json(json!([
                {"id": 1, "name": "Room A", "hasPiano": true},
                {"id": 2, "name": "Room B"}
            ])),
        )
    }

    async fn serve() -> String {
        let app = Router::new().route("/api/rooms", get(rooms));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    #[tokio::test]
    async fn test_bind_loads_first_page() {
        let mut config = AppConfig::default();
        config.api.base_url = serve().await;
        let client = ClientHandle::start(config.into()).await.unwrap();
        assert!(client.hub().is_none());

        let mut rooms = client.bind::<Room>("rooms", "");
        let mut snapshot = rooms.snapshot().await;
        for _ in 0..50 {
            if !snapshot.items.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
            snapshot = rooms.snapshot().await;
        }

        assert_eq!(snapshot.items.len(), 2);
        assert!(!snapshot.has_more);
        assert!(rooms.toggle(&snapshot.items[0]));
        assert!(rooms.selection().is_selected("1"));

        drop(rooms);
        client.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = AppConfig::default();
        config.query.page_size = 0;
        let result = ClientHandle::start(config.into()).await;
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_table_uses_configured_page_size() {
        let mut config = AppConfig::default();
        config.query.page_size = 25;
        let client = ClientHandle::start(config.into()).await.unwrap();

        let mut table = client.table::<Room>();
        assert_eq!(table.begin().request.page_size, 25);
        client.shutdown().await;
    }
}
