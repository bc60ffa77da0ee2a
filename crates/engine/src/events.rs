//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Watchers and the aggregator publish a [`MonitorEvent`] for every
//! externally interesting transition. The control-surface server
//! subscribes and forwards them to its WebSocket clients.

use chrono::{DateTime, Utc};
use pvwatch_core::verdict::Verdict;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// MonitorEvent
// ---------------------------------------------------------------------------

/// A state transition inside the watcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A target received its first sample after being disconnected.
    TargetConnected { target: String },

    /// The subscription for a target reported a disconnect.
    TargetDisconnected { target: String },

    /// A target's verdict flipped.
    VerdictChanged {
        target: String,
        verdict: Verdict,
        value: Option<f64>,
    },

    /// An operator bounds write was rejected; the previous pair stays.
    BoundsRejected { target: String, low: f64, high: f64 },

    /// The master enable switch was written.
    MasterEnableChanged { enabled: bool },

    /// The summary status flipped.
    SummaryChanged { status: Verdict, alarm_count: usize },
}

/// A [`MonitorEvent`] with the time it was published.
#[derive(Debug, Clone, Serialize)]
pub struct TimedEvent {
    #[serde(flatten)]
    pub event: MonitorEvent,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out bus shared via `Arc<EventBus>`.
///
/// Slow receivers that fall more than the channel capacity behind observe
/// `RecvError::Lagged` and skip ahead; they can always re-read current
/// state from the snapshots.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<TimedEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: MonitorEvent) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(TimedEvent {
            event,
            timestamp: Utc::now(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimedEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
