//! Live state and verdict of a single monitored PV.
//!
//! Every input change on a [`TargetWatcher`] runs as one unit under the
//! target's mutex: update the inputs, recompute the verdict, publish the
//! snapshot, report to the aggregator. Two writers to the same target are
//! therefore serialized, while different targets never share a lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pvwatch_core::bounds::Bounds;
use pvwatch_core::config::TargetDescriptor;
use pvwatch_core::error::CoreError;
use pvwatch_core::verdict::{evaluate_target, TargetInputs, Verdict};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::aggregator::AlarmAggregator;
use crate::events::{EventBus, MonitorEvent};
use crate::subscription::PvUpdate;

/// Immutable view of a target after its last recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSnapshot {
    pub name: String,
    pub enabled: bool,
    pub low: f64,
    pub high: f64,
    pub connected: bool,
    /// Last known value; `None` while disconnected.
    pub value: Option<f64>,
    pub verdict: Verdict,
    /// When the last sample was accepted.
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct TargetState {
    enabled: bool,
    connected: bool,
    value: Option<f64>,
    bounds: Bounds,
    verdict: Verdict,
    last_update: Option<DateTime<Utc>>,
}

impl TargetState {
    fn inputs(&self) -> TargetInputs {
        TargetInputs {
            enabled: self.enabled,
            connected: self.connected,
            value: self.value,
            bounds: self.bounds,
        }
    }

    fn snapshot(&self, name: &str) -> TargetSnapshot {
        TargetSnapshot {
            name: name.to_string(),
            enabled: self.enabled,
            low: self.bounds.low(),
            high: self.bounds.high(),
            connected: self.connected,
            value: self.value,
            verdict: self.verdict,
            last_update: self.last_update,
        }
    }
}

/// Verdict of a target that has not heard from its subscription yet.
pub fn initial_verdict(enabled: bool, bounds: Bounds) -> Verdict {
    evaluate_target(&TargetInputs {
        enabled,
        connected: false,
        value: None,
        bounds,
    })
}

#[derive(Debug)]
pub struct TargetWatcher {
    name: String,
    state: Mutex<TargetState>,
    snapshot_tx: watch::Sender<TargetSnapshot>,
    aggregator: Arc<AlarmAggregator>,
    events: Arc<EventBus>,
}

impl TargetWatcher {
    /// Build a watcher in its never-connected state.
    ///
    /// The aggregator must already know this target with
    /// [`initial_verdict`].
    pub fn new(
        descriptor: &TargetDescriptor,
        aggregator: Arc<AlarmAggregator>,
        events: Arc<EventBus>,
    ) -> Result<Self, CoreError> {
        let bounds = descriptor.bounds()?;
        let state = TargetState {
            enabled: descriptor.enabled,
            connected: false,
            value: None,
            bounds,
            verdict: initial_verdict(descriptor.enabled, bounds),
            last_update: None,
        };
        let (snapshot_tx, _) = watch::channel(state.snapshot(&descriptor.name));

        Ok(Self {
            name: descriptor.name.clone(),
            state: Mutex::new(state),
            snapshot_tx,
            aggregator,
            events,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dispatch a subscription notification.
    pub async fn apply(&self, update: PvUpdate) {
        match update {
            PvUpdate::Sample(value) => self.on_sample(value).await,
            PvUpdate::Disconnected => self.on_disconnect().await,
        }
    }

    /// A new value arrived; the PV is connected.
    pub async fn on_sample(&self, value: f64) {
        let mut state = self.state.lock().await;
        if !state.connected {
            tracing::info!(target_pv = %self.name, value, "Target connected");
            self.events.publish(MonitorEvent::TargetConnected {
                target: self.name.clone(),
            });
        }
        state.connected = true;
        state.value = Some(value);
        state.last_update = Some(Utc::now());
        self.commit(&mut state).await;
    }

    /// The PV cannot be read any more.
    pub async fn on_disconnect(&self) {
        let mut state = self.state.lock().await;
        if state.connected {
            tracing::warn!(target_pv = %self.name, "Target disconnected");
            self.events.publish(MonitorEvent::TargetDisconnected {
                target: self.name.clone(),
            });
        }
        state.connected = false;
        state.value = None;
        self.commit(&mut state).await;
    }

    /// Enable or disable the target.
    ///
    /// The held value survives a disable/enable cycle; a target that lost
    /// its connection meanwhile still alarms through `connected == false`.
    pub async fn set_enabled(&self, enabled: bool) {
        let mut state = self.state.lock().await;
        if enabled != state.enabled {
            tracing::info!(target_pv = %self.name, enabled, "Target enable changed");
        }
        state.enabled = enabled;
        self.commit(&mut state).await;
    }

    /// Replace both bounds. Rejected without any state change unless both
    /// are finite and `low <= high`.
    pub async fn set_bounds(&self, low: f64, high: f64) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        self.accept_bounds(&mut state, Bounds::new(low, high)).await
    }

    /// Replace the low bound, paired with the current high bound.
    pub async fn set_low(&self, low: f64) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        let candidate = state.bounds.with_low(low);
        self.accept_bounds(&mut state, candidate).await
    }

    /// Replace the high bound, paired with the current low bound.
    pub async fn set_high(&self, high: f64) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        let candidate = state.bounds.with_high(high);
        self.accept_bounds(&mut state, candidate).await
    }

    pub fn current_verdict(&self) -> Verdict {
        self.snapshot_tx.borrow().verdict
    }

    pub fn snapshot(&self) -> TargetSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Receive a new snapshot after every recompute.
    pub fn subscribe(&self) -> watch::Receiver<TargetSnapshot> {
        self.snapshot_tx.subscribe()
    }

    async fn accept_bounds(
        &self,
        state: &mut TargetState,
        candidate: Result<Bounds, CoreError>,
    ) -> Result<(), CoreError> {
        match candidate {
            Ok(bounds) => {
                tracing::info!(
                    target_pv = %self.name,
                    low = bounds.low(),
                    high = bounds.high(),
                    "Target bounds changed",
                );
                state.bounds = bounds;
                self.commit(state).await;
                Ok(())
            }
            Err(e) => {
                if let CoreError::InvalidBounds { low, high } = e {
                    tracing::warn!(
                        target_pv = %self.name,
                        low,
                        high,
                        "Rejected bounds write, keeping previous bounds",
                    );
                    self.events.publish(MonitorEvent::BoundsRejected {
                        target: self.name.clone(),
                        low,
                        high,
                    });
                }
                Err(e)
            }
        }
    }

    /// Recompute the verdict from `state` and publish it.
    ///
    /// The target snapshot is published before the aggregator hears about
    /// it, so a reader may briefly see the new target verdict next to the
    /// previous summary.
    ///
    /// Called with the target lock held so the aggregator never sees
    /// reports for the same target out of order.
    async fn commit(&self, state: &mut TargetState) {
        let previous = state.verdict;
        state.verdict = evaluate_target(&state.inputs());
        self.snapshot_tx.send_replace(state.snapshot(&self.name));
        self.aggregator.report(&self.name, state.verdict).await;

        if previous != state.verdict {
            match state.verdict {
                Verdict::Alarm => tracing::warn!(
                    target_pv = %self.name,
                    value = ?state.value,
                    connected = state.connected,
                    low = state.bounds.low(),
                    high = state.bounds.high(),
                    "Target in ALARM",
                ),
                Verdict::Ok => tracing::info!(target_pv = %self.name, "Target back to OK"),
            }
            self.events.publish(MonitorEvent::VerdictChanged {
                target: self.name.clone(),
                verdict: state.verdict,
                value: state.value,
            });
        }
    }
}
