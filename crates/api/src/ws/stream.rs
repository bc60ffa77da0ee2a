use std::sync::Arc;
use std::time::Duration;

use pvwatch_engine::EventBus;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{Instant, MissedTickBehavior};

use crate::ws::manager::WsManager;

/// Interval between keep-alive pings on the event stream.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Spawn the task that feeds every event-stream client.
///
/// Engine events are broadcast as they arrive and a Ping goes out every
/// `heartbeat`. The task ends when the event bus is dropped.
pub fn spawn_event_stream(
    events: &EventBus,
    ws_manager: Arc<WsManager>,
    heartbeat: Duration,
) -> tokio::task::JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + heartbeat, heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Ok(event) => {
                        if let Err(e) = ws_manager.broadcast(&event).await {
                            tracing::error!(error = %e, "Failed to serialize event");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Event stream lagged, events dropped");
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("Event bus closed, stopping event stream");
                        return;
                    }
                },
                _ = ticker.tick() => {
                    let count = ws_manager.connection_count().await;
                    tracing::debug!(
                        count,
                        "Event stream heartbeat",
                    );
                    ws_manager.ping_all().await;
                }
            }
        }
    })
}
