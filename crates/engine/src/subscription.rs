//! Boundary between the engine and whatever delivers PV updates.
//!
//! A [`SubscriptionAdapter`] turns a PV name into a stream of
//! [`PvUpdate`]s. Reconnection and retry are the adapter's business; the
//! engine only reacts to the samples and disconnects it is given. If the
//! stream ends, the target is treated as disconnected.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::watcher::TargetWatcher;

/// Buffer size of each per-target update channel.
pub const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// A single notification about a remote PV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PvUpdate {
    /// The PV is connected and currently holds this value.
    Sample(f64),
    /// The PV cannot be read.
    Disconnected,
}

/// Source of [`PvUpdate`]s for named PVs.
#[async_trait]
pub trait SubscriptionAdapter: Send + Sync {
    /// Start delivering updates for `pv_name`.
    ///
    /// The adapter stops feeding the returned channel once `cancel` fires
    /// or the receiver is dropped.
    async fn subscribe(&self, pv_name: &str, cancel: CancellationToken)
        -> mpsc::Receiver<PvUpdate>;
}

/// Forward updates from `rx` into `watcher` until cancelled.
///
/// When the adapter closes the channel the watcher is marked disconnected
/// and the pump exits.
pub async fn pump_updates(
    watcher: Arc<TargetWatcher>,
    mut rx: mpsc::Receiver<PvUpdate>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(target_pv = %watcher.name(), "Update pump cancelled");
                return;
            }
            update = rx.recv() => match update {
                Some(update) => watcher.apply(update).await,
                None => {
                    tracing::warn!(
                        target_pv = %watcher.name(),
                        "Subscription closed by adapter, marking target disconnected",
                    );
                    watcher.on_disconnect().await;
                    return;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// LocalAdapter
// ---------------------------------------------------------------------------

/// In-process adapter: updates are injected by calling [`LocalAdapter::send`].
///
/// Useful for embedding the engine next to a data source that already
/// lives in the same process, and for driving the engine in tests.
#[derive(Default)]
pub struct LocalAdapter {
    senders: Mutex<HashMap<String, mpsc::Sender<PvUpdate>>>,
}

impl LocalAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `update` to the subscriber of `pv_name`.
    ///
    /// Returns `false` if nobody is subscribed or the subscriber is gone.
    pub async fn send(&self, pv_name: &str, update: PvUpdate) -> bool {
        let sender = self.senders.lock().await.get(pv_name).cloned();
        match sender {
            Some(tx) => tx.send(update).await.is_ok(),
            None => false,
        }
    }

    pub async fn sample(&self, pv_name: &str, value: f64) -> bool {
        self.send(pv_name, PvUpdate::Sample(value)).await
    }

    pub async fn disconnect(&self, pv_name: &str) -> bool {
        self.send(pv_name, PvUpdate::Disconnected).await
    }

    /// Drop the sender for `pv_name`, ending its update stream.
    pub async fn close(&self, pv_name: &str) {
        self.senders.lock().await.remove(pv_name);
    }

    pub async fn subscribed(&self) -> Vec<String> {
        self.senders.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl SubscriptionAdapter for LocalAdapter {
    async fn subscribe(
        &self,
        pv_name: &str,
        _cancel: CancellationToken,
    ) -> mpsc::Receiver<PvUpdate> {
        let (tx, rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        self.senders.lock().await.insert(pv_name.to_string(), tx);
        rx
    }
}
