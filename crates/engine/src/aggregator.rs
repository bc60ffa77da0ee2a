//! Summary alarm over all targets plus the master switch.
//!
//! [`AlarmAggregator`] is the single serialization point for the summary:
//! every verdict report and every master-enable write recomputes under
//! one mutex. The result is published through a `watch` channel so any
//! number of readers can take a consistent snapshot without locking.
//! Recomputing with unchanged inputs publishes nothing.

use std::collections::HashMap;
use std::sync::Arc;

use pvwatch_core::verdict::{summarize, Verdict};
use serde::Serialize;
use tokio::sync::{watch, Mutex};

use crate::events::{EventBus, MonitorEvent};

/// Immutable view of the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummarySnapshot {
    pub master_enabled: bool,
    pub status: Verdict,
    /// Targets currently in ALARM, counted even when the master switch
    /// suppresses them.
    pub alarm_count: usize,
    pub target_count: usize,
}

#[derive(Debug)]
struct AggregatorState {
    master_enabled: bool,
    verdicts: HashMap<String, Verdict>,
}

impl AggregatorState {
    fn snapshot(&self) -> SummarySnapshot {
        SummarySnapshot {
            master_enabled: self.master_enabled,
            status: summarize(self.master_enabled, self.verdicts.values().copied()),
            alarm_count: self.verdicts.values().filter(|v| v.is_alarm()).count(),
            target_count: self.verdicts.len(),
        }
    }
}

#[derive(Debug)]
pub struct AlarmAggregator {
    state: Mutex<AggregatorState>,
    summary_tx: watch::Sender<SummarySnapshot>,
    events: Arc<EventBus>,
}

impl AlarmAggregator {
    /// Create the aggregator with the fixed target set and each target's
    /// initial verdict.
    pub fn new<I>(master_enabled: bool, verdicts: I, events: Arc<EventBus>) -> Self
    where
        I: IntoIterator<Item = (String, Verdict)>,
    {
        let state = AggregatorState {
            master_enabled,
            verdicts: verdicts.into_iter().collect(),
        };
        let (summary_tx, _) = watch::channel(state.snapshot());
        Self {
            state: Mutex::new(state),
            summary_tx,
            events,
        }
    }

    /// Record `target`'s latest verdict and recompute.
    ///
    /// Reports for names outside the configured set are ignored.
    pub async fn report(&self, target: &str, verdict: Verdict) {
        let mut state = self.state.lock().await;
        match state.verdicts.get_mut(target) {
            Some(slot) => *slot = verdict,
            None => {
                tracing::warn!(target_pv = %target, "Ignoring verdict for unknown target");
                return;
            }
        }
        self.publish(&state);
    }

    /// Write the master enable switch and recompute.
    pub async fn set_master_enabled(&self, enabled: bool) {
        let mut state = self.state.lock().await;
        tracing::info!(enabled, "Master enable changed");
        state.master_enabled = enabled;
        self.events
            .publish(MonitorEvent::MasterEnableChanged { enabled });
        self.publish(&state);
    }

    /// Recompute from the current inputs.
    pub async fn recompute(&self) {
        let state = self.state.lock().await;
        self.publish(&state);
    }

    pub fn summary(&self) -> Verdict {
        self.summary_tx.borrow().status
    }

    pub fn master_enabled(&self) -> bool {
        self.summary_tx.borrow().master_enabled
    }

    pub fn snapshot(&self) -> SummarySnapshot {
        *self.summary_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SummarySnapshot> {
        self.summary_tx.subscribe()
    }

    /// Push the snapshot for `state` if it differs from the published one.
    ///
    /// Must be called with the state lock held.
    fn publish(&self, state: &AggregatorState) {
        let next = state.snapshot();
        let mut previous_status = next.status;

        let modified = self.summary_tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            previous_status = current.status;
            *current = next;
            true
        });

        if modified && previous_status != next.status {
            match next.status {
                Verdict::Alarm => tracing::warn!(
                    alarm_count = next.alarm_count,
                    "Summary status changed to ALARM"
                ),
                Verdict::Ok => tracing::info!(
                    master_enabled = next.master_enabled,
                    "Summary status changed to OK"
                ),
            }
            self.events.publish(MonitorEvent::SummaryChanged {
                status: next.status,
                alarm_count: next.alarm_count,
            });
        }
    }
}
