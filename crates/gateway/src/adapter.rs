//! [`SubscriptionAdapter`] backed by the gateway.
//!
//! Every subscribed PV gets its own connection task: connect, forward
//! messages, report a disconnect when the socket drops, reconnect with
//! backoff. The task ends when its cancellation token fires or the
//! watcher side drops the receiver.

use async_trait::async_trait;
use pvwatch_engine::subscription::UPDATE_CHANNEL_CAPACITY;
use pvwatch_engine::{PvUpdate, SubscriptionAdapter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::{GatewayClient, GatewayConnection};
use crate::processor::{process_messages, StreamEnd};
use crate::reconnect::{connect_with_backoff, ReconnectConfig};

pub struct GatewayAdapter {
    url: String,
    reconnect: ReconnectConfig,
}

impl GatewayAdapter {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_reconnect(url, ReconnectConfig::default())
    }

    pub fn with_reconnect(url: impl Into<String>, reconnect: ReconnectConfig) -> Self {
        Self {
            url: url.into(),
            reconnect,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SubscriptionAdapter for GatewayAdapter {
    async fn subscribe(
        &self,
        pv_name: &str,
        cancel: CancellationToken,
    ) -> mpsc::Receiver<PvUpdate> {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let client = GatewayClient::new(self.url.clone(), pv_name);
        let reconnect = self.reconnect.clone();

        tokio::spawn(async move {
            tracing::info!(pv = %client.pv(), "Starting gateway connection task");
            run_connection_loop(&client, &reconnect, &tx, &cancel).await;
            tracing::info!(pv = %client.pv(), "Gateway connection task exited");
        });

        rx
    }
}

/// Connect, process, reconnect until cancelled or the receiver is gone.
async fn run_connection_loop(
    client: &GatewayClient,
    reconnect: &ReconnectConfig,
    tx: &mpsc::Sender<PvUpdate>,
    cancel: &CancellationToken,
) {
    loop {
        let conn = tokio::select! {
            _ = tx.closed() => return,
            conn = connect_with_backoff(client, reconnect, cancel) => match conn {
                Some(conn) => conn,
                None => return,
            },
        };

        let GatewayConnection { pv, mut ws_stream } = conn;
        match process_messages(&mut ws_stream, &pv, tx, cancel).await {
            StreamEnd::Cancelled | StreamEnd::ReceiverDropped => return,
            StreamEnd::Closed => {
                if tx.send(PvUpdate::Disconnected).await.is_err() {
                    return;
                }
                tracing::info!(pv = %pv, "Gateway connection lost, reconnecting");
            }
        }
    }
}
