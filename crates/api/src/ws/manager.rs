use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes};
use pvwatch_engine::{SummarySnapshot, TargetSnapshot, TimedEvent};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Outbound item queued for one event-stream client.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// Serialized JSON document, shared by every client it was sent to.
    Json(Utf8Bytes),
    Ping,
    Close,
}

impl From<StreamFrame> for Message {
    fn from(frame: StreamFrame) -> Self {
        match frame {
            StreamFrame::Json(text) => Message::Text(text),
            StreamFrame::Ping => Message::Ping(Bytes::new()),
            StreamFrame::Close => Message::Close(None),
        }
    }
}

/// First frame a client receives: the full state at the time it joined.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename = "state")]
pub struct StateFrame {
    pub summary: SummarySnapshot,
    pub targets: Vec<TargetSnapshot>,
}

/// Registry of event-stream clients, keyed by connection id.
pub struct WsManager {
    clients: RwLock<HashMap<Uuid, mpsc::UnboundedSender<StreamFrame>>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Register a client and queue its initial [`StateFrame`].
    ///
    /// Returns the new connection id and the queue the socket task drains.
    pub async fn join(
        &self,
        state: &StateFrame,
    ) -> Result<(Uuid, mpsc::UnboundedReceiver<StreamFrame>), serde_json::Error> {
        let first = StreamFrame::Json(serde_json::to_string(state)?.into());
        let (tx, rx) = mpsc::unbounded_channel();
        // Queued before the client is visible to `broadcast`.
        let _ = tx.send(first);

        let id = Uuid::new_v4();
        self.clients.write().await.insert(id, tx);
        Ok((id, rx))
    }

    pub async fn leave(&self, id: &Uuid) {
        self.clients.write().await.remove(id);
    }

    /// Serialize `event` once and queue it for every client.
    ///
    /// Clients whose socket task has gone away are dropped. Returns the
    /// number of clients the event was queued for.
    pub async fn broadcast(&self, event: &TimedEvent) -> Result<usize, serde_json::Error> {
        let text: Utf8Bytes = serde_json::to_string(event)?.into();
        let (queued, stale) = self.send_all(&StreamFrame::Json(text)).await;
        self.prune(stale).await;
        Ok(queued)
    }

    /// Queue a Ping for every client.
    pub async fn ping_all(&self) {
        let (_, stale) = self.send_all(&StreamFrame::Ping).await;
        self.prune(stale).await;
    }

    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Queue a Close for every client, then forget them all.
    pub async fn shutdown_all(&self) {
        let mut clients = self.clients.write().await;
        for tx in clients.values() {
            let _ = tx.send(StreamFrame::Close);
        }
        tracing::info!(count = clients.len(), "Closed all event-stream clients");
        clients.clear();
    }

    /// Returns how many clients took the frame and the ids that did not.
    async fn send_all(&self, frame: &StreamFrame) -> (usize, Vec<Uuid>) {
        let clients = self.clients.read().await;
        let stale: Vec<Uuid> = clients
            .iter()
            .filter(|(_, tx)| tx.send(frame.clone()).is_err())
            .map(|(id, _)| *id)
            .collect();
        (clients.len() - stale.len(), stale)
    }

    async fn prune(&self, stale: Vec<Uuid>) {
        if stale.is_empty() {
            return;
        }
        let mut clients = self.clients.write().await;
        for id in &stale {
            clients.remove(id);
        }
        tracing::debug!(dropped = stale.len(), "Pruned closed event-stream clients");
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
