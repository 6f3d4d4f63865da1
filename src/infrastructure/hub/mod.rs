//! WebSocket adapter for the notification hub

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::domain::{HubConnector, HubTransport, TokenProvider};
use crate::shared::HubError;

/// Connects to the hub over WebSocket, sending the bearer token on upgrade
pub struct WsConnector {
    url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl WsConnector {
    pub fn new(url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            url: url.into(),
            tokens,
        }
    }
}

#[async_trait]
impl HubConnector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn HubTransport>, HubError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| HubError::Connect(e.to_string()))?;

        let token = self
            .tokens
            .bearer_token()
            .await
            .map_err(|e| HubError::Connect(e.to_string()))?;
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| HubError::Connect(e.to_string()))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| HubError::Connect(e.to_string()))?;

        info!(url = %self.url, "Hub WebSocket connected");
        Ok(Box::new(WsTransport { stream }))
    }
}

struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl HubTransport for WsTransport {
    async fn next_frame(&mut self) -> Option<Result<String, HubError>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                Some(Ok(Message::Binary(bytes))) => {
                    return Some(
                        String::from_utf8(bytes.to_vec())
                            .map_err(|e| HubError::Decode(e.to_string())),
                    );
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Hub sent close frame");
                    return None;
                }
                // Pings are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Some(Err(HubError::Disconnected(e.to_string()))),
                None => return None,
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Hub close handshake failed");
        }
    }
}
