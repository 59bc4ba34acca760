//! Keepalive scheduler
//!
//! Periodically publishes a heartbeat into a reserved tunnel so that
//! streaming connections behind idle-timeout proxies keep seeing traffic.
//! The scheduler has an explicit lifecycle: [`KeepaliveScheduler::spawn`]
//! starts it and [`KeepaliveHandle::shutdown`] stops it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::pubsub::{Relay, SendReport};
use crate::registry::{ChannelKey, RelayError, DEFAULT_SUBCHANNEL};

/// Reserved tunnel that receives heartbeats
pub const KEEPALIVE_TUNNEL: &str = "global";

/// Heartbeat payload
pub const KEEPALIVE_PAYLOAD: &str = "ping";

/// Keepalive configuration
#[derive(Debug, Clone)]
pub struct KeepaliveConfig {
    /// Whether the scheduler runs at all
    pub enabled: bool,
    /// Time between heartbeats
    pub period: Duration,
    /// Reserved tunnel ID
    pub tunnel: String,
    /// Subchannel the heartbeat is published to
    pub subchannel: String,
    /// Heartbeat content
    pub payload: String,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period: Duration::from_secs(10 * 60),
            tunnel: KEEPALIVE_TUNNEL.to_string(),
            subchannel: DEFAULT_SUBCHANNEL.to_string(),
            payload: KEEPALIVE_PAYLOAD.to_string(),
        }
    }
}

impl KeepaliveConfig {
    /// Set the heartbeat period
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Disable the scheduler
    pub fn disable(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Channel the heartbeat is published to
    pub fn key(&self) -> ChannelKey {
        ChannelKey::new(self.tunnel.clone(), self.subchannel.clone())
    }
}

/// Background heartbeat publisher
pub struct KeepaliveScheduler {
    relay: Arc<Relay>,
    config: KeepaliveConfig,
}

impl KeepaliveScheduler {
    /// Create a scheduler (not started)
    pub fn new(relay: Arc<Relay>, config: KeepaliveConfig) -> Self {
        Self { relay, config }
    }

    /// Create the reserved tunnel if it is not there yet
    pub fn prepare(&self) -> Result<(), RelayError> {
        match self.relay.create(&self.config.tunnel) {
            Ok(_) | Err(RelayError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Publish one heartbeat
    ///
    /// A missing reserved tunnel is logged and skipped.
    pub fn tick(&self) -> Option<SendReport> {
        match self.relay.send(&self.config.key(), &self.config.payload) {
            Ok(report) => {
                tracing::debug!(
                    tunnel = %self.config.tunnel,
                    delivered = report.delivered,
                    "Keepalive sent"
                );
                Some(report)
            }
            Err(e) => {
                tracing::warn!(tunnel = %self.config.tunnel, error = %e, "Keepalive skipped");
                None
            }
        }
    }

    /// Create the reserved tunnel and start ticking
    ///
    /// The first heartbeat goes out one full period after this call.
    pub fn spawn(self) -> Result<KeepaliveHandle, RelayError> {
        self.prepare()?;

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = self.config.period;

        tracing::info!(
            tunnel = %self.config.tunnel,
            period_secs = period.as_secs(),
            "Keepalive scheduler started"
        );

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        self.tick();
                    }
                }
            }
            tracing::info!(tunnel = %self.config.tunnel, "Keepalive scheduler stopped");
        });

        Ok(KeepaliveHandle { token, task })
    }
}

/// Handle to a running scheduler
pub struct KeepaliveHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl KeepaliveHandle {
    /// Stop the scheduler and wait for its task to finish
    pub async fn shutdown(self) {
        self.token.cancel();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Keepalive task failed");
        }
    }
}
