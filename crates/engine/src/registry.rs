//! The fixed set of watchers, built once from configuration.
//!
//! [`WatcherRegistry::new`] is the only place target identities are
//! created. It validates the whole configuration first, so a duplicate
//! name or bad default fails before any watcher exists.
//! [`WatcherRegistry::start`] then subscribes every target and spawns one
//! pump task per target.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pvwatch_core::config::MonitorConfig;
use pvwatch_core::error::CoreError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::aggregator::AlarmAggregator;
use crate::events::EventBus;
use crate::subscription::{pump_updates, SubscriptionAdapter};
use crate::watcher::{initial_verdict, TargetSnapshot, TargetWatcher};

/// How long shutdown waits for each pump task to exit.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct WatcherRegistry {
    /// Target names in configuration order.
    order: Vec<String>,
    watchers: HashMap<String, Arc<TargetWatcher>>,
    aggregator: Arc<AlarmAggregator>,
    events: Arc<EventBus>,
    /// Master cancellation token -- cancelled during shutdown.
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl WatcherRegistry {
    /// Validate `config` and build one watcher per target.
    pub fn new(config: &MonitorConfig, events: Arc<EventBus>) -> Result<Self, CoreError> {
        config.validate()?;

        let mut seeds = Vec::with_capacity(config.targets.len());
        for descriptor in &config.targets {
            seeds.push((
                descriptor.name.clone(),
                initial_verdict(descriptor.enabled, descriptor.bounds()?),
            ));
        }
        let aggregator = Arc::new(AlarmAggregator::new(
            config.master_enable,
            seeds,
            Arc::clone(&events),
        ));

        let mut order = Vec::with_capacity(config.targets.len());
        let mut watchers = HashMap::with_capacity(config.targets.len());
        for descriptor in &config.targets {
            let watcher = TargetWatcher::new(descriptor, Arc::clone(&aggregator), Arc::clone(&events))?;
            if watchers
                .insert(descriptor.name.clone(), Arc::new(watcher))
                .is_some()
            {
                return Err(CoreError::DuplicateTarget(descriptor.name.clone()));
            }
            order.push(descriptor.name.clone());
        }

        tracing::info!(
            count = order.len(),
            master_enabled = config.master_enable,
            "Watcher registry built",
        );

        Ok(Self {
            order,
            watchers,
            aggregator,
            events,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        })
    }

    /// Subscribe every target through `adapter` and start its pump task.
    ///
    /// Only the first call has any effect.
    pub async fn start(&self, adapter: Arc<dyn SubscriptionAdapter>) {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("Watcher registry already started");
            return;
        }

        let mut tasks = self.tasks.lock().await;
        for watcher in self.watchers() {
            let cancel = self.cancel.child_token();
            tracing::info!(target_pv = %watcher.name(), "Subscribing to target");
            let rx = adapter.subscribe(watcher.name(), cancel.clone()).await;
            tasks.push(tokio::spawn(pump_updates(Arc::clone(watcher), rx, cancel)));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TargetWatcher>> {
        self.watchers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.watchers.contains_key(name)
    }

    /// Target names in configuration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Watchers in configuration order.
    pub fn watchers(&self) -> impl Iterator<Item = &Arc<TargetWatcher>> {
        self.order.iter().filter_map(|name| self.watchers.get(name))
    }

    pub fn snapshots(&self) -> Vec<TargetSnapshot> {
        self.watchers().map(|w| w.snapshot()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn aggregator(&self) -> &Arc<AlarmAggregator> {
        &self.aggregator
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Stop all pump tasks. Used on process exit only.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down watcher registry");
        self.cancel.cancel();

        let mut tasks = self.tasks.lock().await;
        for handle in tasks.drain(..) {
            let _ = tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, handle).await;
        }

        tracing::info!("Watcher registry shut down complete");
    }
}
