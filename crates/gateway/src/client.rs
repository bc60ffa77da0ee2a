//! WebSocket client for a single PV on the gateway.
//!
//! [`GatewayClient`] holds the gateway URL and the PV name. Call
//! [`GatewayClient::connect`] to open a socket and subscribe.

use futures::SinkExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::messages::ClientMessage;

pub type GatewayStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub struct GatewayClient {
    url: String,
    pv: String,
}

/// A live, subscribed connection.
pub struct GatewayConnection {
    pub pv: String,
    pub ws_stream: GatewayStream,
}

impl GatewayClient {
    /// * `url` - gateway WebSocket URL, e.g. `ws://host:8080/pv`.
    /// * `pv`  - the PV this client subscribes to.
    pub fn new(url: impl Into<String>, pv: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pv: pv.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pv(&self) -> &str {
        &self.pv
    }

    /// Connect and send the subscribe request for this PV.
    pub async fn connect(&self) -> Result<GatewayConnection, GatewayClientError> {
        let (mut ws_stream, _response) = connect_async(self.url.as_str()).await.map_err(|e| {
            GatewayClientError::Connection(format!(
                "Failed to connect to gateway at {}: {e}",
                self.url
            ))
        })?;

        let request = serde_json::to_string(&ClientMessage::subscribe(&self.pv))
            .map_err(|e| GatewayClientError::Protocol(e.to_string()))?;
        ws_stream
            .send(Message::Text(request))
            .await
            .map_err(|e| GatewayClientError::Protocol(format!("Subscribe failed: {e}")))?;

        tracing::info!(pv = %self.pv, url = %self.url, "Subscribed via gateway");

        Ok(GatewayConnection {
            pv: self.pv.clone(),
            ws_stream,
        })
    }
}

/// Errors that can occur when working with the gateway client.
#[derive(Debug, thiserror::Error)]
pub enum GatewayClientError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
