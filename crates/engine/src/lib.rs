//! Runtime side of the PV watcher: per-target watchers, the summary
//! aggregator, the registry that owns them, and the named control surface.

pub mod aggregator;
pub mod control;
pub mod events;
pub mod registry;
pub mod subscription;
pub mod watcher;

pub use aggregator::{AlarmAggregator, SummarySnapshot};
pub use control::{ControlError, ControlSurface, PvAddress, PvReading, PvValue, TargetField};
pub use events::{EventBus, MonitorEvent, TimedEvent};
pub use registry::WatcherRegistry;
pub use subscription::{LocalAdapter, PvUpdate, SubscriptionAdapter};
pub use watcher::{TargetSnapshot, TargetWatcher};
