//! HTTP client for collection endpoints
//!
//! Translates a [`PageRequest`] into exactly one `GET` and normalizes the
//! response into a [`PagedResult`]. No retries, no caching: this is a pure
//! translation layer.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use validator::Validate;

use crate::config::ApiConfig;
use crate::domain::{PageSource, TokenProvider};
use crate::infrastructure::http::StaticToken;
use crate::shared::{FetchError, FetchResult, PageMetadata, PageRequest, PagedResult};

/// Longest server error body kept in [`FetchError::Status`]
const MAX_ERROR_BODY: usize = 512;

/// Collection body: a bare JSON array, or an object wrapping it in `items`
#[derive(Deserialize)]
#[serde(untagged)]
enum PageBody<T> {
    List(Vec<T>),
    Wrapped { items: Vec<T> },
}

impl<T> PageBody<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            PageBody::List(items) | PageBody::Wrapped { items } => items,
        }
    }
}

/// REST client for the school backend
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        tokens: Arc<dyn TokenProvider>,
    ) -> FetchResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| FetchError::InvalidRequest(format!("bad base url {base_url}: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            timeout,
            tokens,
        })
    }

    /// Client from `[api]` config with its static token (if any)
    pub fn from_config(config: &ApiConfig) -> FetchResult<Self> {
        Self::new(
            config.base_url.clone(),
            config.timeout(),
            Arc::new(StaticToken::from_option(config.token.clone())),
        )
    }

    /// Same client with a different token source
    pub fn with_tokens(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Bind this client to one resource as a [`PageSource`]
    pub fn resource<T>(self: &Arc<Self>, name: impl Into<String>) -> ResourceSource<T> {
        ResourceSource {
            client: Arc::clone(self),
            resource: name.into(),
            _item: PhantomData,
        }
    }

    fn resource_url(&self, resource: &str) -> FetchResult<Url> {
        let raw = format!("{}/{}", self.base_url, resource.trim_matches('/'));
        Url::parse(&raw).map_err(|e| FetchError::InvalidRequest(format!("bad url {raw}: {e}")))
    }

    fn map_transport(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }

    /// Fetch one page of `resource`.
    ///
    /// Metadata comes from the `x-page*` / `x-total-*` headers and falls back
    /// to defaults; only transport, status and body errors are reported.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        resource: &str,
        request: &PageRequest,
    ) -> FetchResult<PagedResult<T>> {
        request
            .validate()
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;

        let url = self.resource_url(resource)?;
        let mut builder = self.http.get(url).query(&request.query_pairs());

        if let Some(token) = self.tokens.bearer_token().await? {
            builder = builder.bearer_auth(token);
        }

        debug!(
            resource,
            page = request.page,
            size = request.page_size,
            keyword = ?request.keyword,
            "Fetching page"
        );

        let response = builder.send().await.map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if !status.is_success() {
            let mut message = response.text().await.unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            warn!(resource, status = status.as_u16(), "Page fetch rejected by server");
            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(FetchError::Auth(format!("{status}: {message}")));
            }
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let metadata = PageMetadata::from_headers(response.headers());
        let body = response.bytes().await.map_err(|e| self.map_transport(e))?;
        let items = serde_json::from_slice::<PageBody<T>>(&body)
            .map_err(|e| FetchError::Decode(e.to_string()))?
            .into_items();

        debug!(
            resource,
            page = metadata.page,
            total_pages = metadata.total_pages,
            total_count = metadata.total_count,
            received = items.len(),
            "Page received"
        );

        Ok(PagedResult::new(items, metadata))
    }
}

/// An [`ApiClient`] bound to one resource path
pub struct ResourceSource<T> {
    client: Arc<ApiClient>,
    resource: String,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceSource<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            resource: self.resource.clone(),
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<T> PageSource<T> for ResourceSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch_page(&self, request: &PageRequest) -> FetchResult<PagedResult<T>> {
        self.client.fetch_page(&self.resource, request).await
    }

    fn resource(&self) -> &str {
        &self.resource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QueryOptions, Room};
    use axum::extract::RawQuery;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn echo_rooms(RawQuery(query): RawQuery, headers: HeaderMap) -> impl IntoResponse {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        (
            [
                ("x-page", "2"),
                ("x-page-size", "10"),
                ("x-total-pages", "3"),
                ("x-total-count", "25"),
            ],
            Json(json!([{ "id": 1, "query": query, "auth": auth }])),
        )
    }

    async fn wrapped_rooms() -> impl IntoResponse {
        Json(json!({ "items": [
            { "id": 1, "name": "Room A", "hasPiano": true },
            { "id": 2, "name": "Room B", "capacity": 4 }
        ]}))
    }

    async fn broken() -> impl IntoResponse {
        (StatusCode::INTERNAL_SERVER_ERROR, "database offline")
    }

    async fn slow() -> impl IntoResponse {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!([]))
    }

    async fn unauthorized() -> impl IntoResponse {
        (StatusCode::UNAUTHORIZED, "token expired")
    }

    async fn not_json() -> impl IntoResponse {
        "<html>login</html>"
    }

    async fn spawn_fixture() -> String {
        let app = Router::new()
            .route("/api/echo", get(echo_rooms))
            .route("/api/rooms", get(wrapped_rooms))
            .route("/api/broken", get(broken))
            .route("/api/slow", get(slow))
            .route("/api/html", get(not_json))
            .route("/api/private", get(unauthorized));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/")
    }

    fn client(base: &str, timeout: Duration, token: Option<&str>) -> ApiClient {
        ApiClient::new(
            base,
            timeout,
            Arc::new(StaticToken::from_option(token.map(String::from))),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_query_and_bearer_and_reads_headers() {
        let base = spawn_fixture().await;
        let client = client(&base, Duration::from_secs(10), Some("secret"));

        let options = QueryOptions::default()
            .sorted_by("name", true)
            .filter("roles", "instructor")
            .filter("roles", "admin");
        let request = PageRequest::first(&options, "Room A").with_page(2);

        let page: PagedResult<Value> = client.fetch_page("echo", &request).await.unwrap();

        assert_eq!(page.metadata.page, 2);
        assert_eq!(page.metadata.total_pages, 3);
        assert_eq!(page.metadata.total_count, 25);
        assert!(page.metadata.has_more());

        let item = &page.items[0];
        assert_eq!(item["auth"], "Bearer secret");
        assert_eq!(
            item["query"],
            "page=2&size=10&column=name&desc=true&q=Room+A&roles=instructor&roles=admin"
        );
    }

    #[tokio::test]
    async fn test_wrapped_body_without_headers_uses_defaults() {
        let base = spawn_fixture().await;
        let client = Arc::new(client(&base, Duration::from_secs(10), None));
        let rooms = client.resource::<Room>("rooms");

        let page = rooms
            .fetch_page(&PageRequest::first(&QueryOptions::default(), ""))
            .await
            .unwrap();

        assert_eq!(rooms.resource(), "rooms");
        assert_eq!(page.metadata, PageMetadata::default());
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].has_piano);
        assert_eq!(page.items[1].capacity, Some(4));
    }

    #[tokio::test]
    async fn test_rejected_token_is_auth_error() {
        let base = spawn_fixture().await;
        let client = client(&base, Duration::from_secs(10), Some("stale"));

        let err = client
            .fetch_page::<Value>("private", &PageRequest::first(&QueryOptions::default(), ""))
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::Auth("401 Unauthorized: token expired".into()));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_is_status_error() {
        let base = spawn_fixture().await;
        let client = client(&base, Duration::from_secs(10), None);

        let err = client
            .fetch_page::<Value>("broken", &PageRequest::first(&QueryOptions::default(), ""))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            FetchError::Status {
                status: 500,
                message: "database offline".to_string()
            }
        );
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let base = spawn_fixture().await;
        let timeout = Duration::from_millis(200);
        let client = client(&base, timeout, None);

        let err = client
            .fetch_page::<Value>("slow", &PageRequest::first(&QueryOptions::default(), ""))
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::Timeout(timeout));
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_error() {
        let base = spawn_fixture().await;
        let client = client(&base, Duration::from_secs(10), None);

        let err = client
            .fetch_page::<Value>("html", &PageRequest::first(&QueryOptions::default(), ""))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_invalid_request_never_hits_network() {
        // Nothing listens here; a network attempt would be a transport error
        let client = client("http://127.0.0.1:9/api", Duration::from_secs(1), None);
        let request = PageRequest::first(&QueryOptions::default(), "").with_page(0);

        let err = client.fetch_page::<Value>("rooms", &request).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let result = ApiClient::new("not a url", Duration::from_secs(1), Arc::new(StaticToken::none()));
        assert!(matches!(result, Err(FetchError::InvalidRequest(_))));
    }
}
