//! Connection retry with exponential backoff.
//!
//! Each outage gets a fresh [`Backoff`]: the first attempt is immediate,
//! later ones wait 1s, 2s, 4s, ... capped at 30s by default.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::client::{GatewayClient, GatewayConnection};

#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Wait after the first failed attempt.
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Delay schedule for one outage.
#[derive(Debug)]
pub struct Backoff {
    config: ReconnectConfig,
    upcoming: Duration,
    failures: u32,
}

impl Backoff {
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            upcoming: config.initial_delay.min(config.max_delay),
            config,
            failures: 0,
        }
    }

    /// Record a failed attempt and return how long to wait before the next.
    pub fn fail(&mut self) -> Duration {
        self.failures += 1;
        let delay = self.upcoming;
        let grown = delay.as_secs_f64() * self.config.multiplier;
        self.upcoming = Duration::try_from_secs_f64(grown)
            .unwrap_or(self.config.max_delay)
            .min(self.config.max_delay);
        delay
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

/// Connect `client`, retrying on the [`Backoff`] schedule of `config`.
///
/// Returns `None` once `cancel` fires.
pub async fn connect_with_backoff(
    client: &GatewayClient,
    config: &ReconnectConfig,
    cancel: &CancellationToken,
) -> Option<GatewayConnection> {
    let mut backoff = Backoff::new(config.clone());

    loop {
        let attempt = tokio::select! {
            _ = cancel.cancelled() => return None,
            attempt = client.connect() => attempt,
        };

        match attempt {
            Ok(conn) => {
                if backoff.failures() > 0 {
                    tracing::info!(
                        pv = %client.pv(),
                        failures = backoff.failures(),
                        "Gateway connection restored",
                    );
                }
                return Some(conn);
            }
            Err(e) => {
                let delay = backoff.fail();
                tracing::warn!(
                    pv = %client.pv(),
                    error = %e,
                    failures = backoff.failures(),
                    retry_in_ms = delay.as_millis() as u64,
                    "Gateway connection failed",
                );
                tokio::select! {
                    _ = cancel.cancelled() => return None,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
