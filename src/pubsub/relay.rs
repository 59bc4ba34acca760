//! Broadcast engine
//!
//! Ties the tunnel registry to the subscription index. A send records the
//! content first, then snapshots the target's sinks, then offers the value
//! to each sink with no lock held.

use std::sync::Arc;

use crate::registry::{ChannelKey, RegistryConfig, RelayError, TunnelRegistry, TunnelSnapshot};
use crate::stats::{RelayCounters, RelayStats};

use super::subscription::{Delivery, SinkId, Subscription, SubscriptionIndex};

/// Result of one fan-out pass
///
/// Informational only: skipped sinks never turn a send into an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendReport {
    /// Sinks that accepted the value
    pub delivered: usize,
    /// Sinks whose buffer was full
    pub full: usize,
    /// Sinks whose consumer was already gone
    pub closed: usize,
}

impl SendReport {
    /// Sinks that did not receive the value live
    pub fn skipped(&self) -> usize {
        self.full + self.closed
    }
}

/// Tunnel registry plus subscriber fan-out
pub struct Relay {
    registry: TunnelRegistry,
    index: SubscriptionIndex,
    counters: RelayCounters,
}

impl Relay {
    /// Create a relay with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a relay with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        let index = SubscriptionIndex::new(config.sink_capacity);
        Self {
            registry: TunnelRegistry::with_config(config),
            index,
            counters: RelayCounters::new(),
        }
    }

    /// The underlying tunnel registry
    pub fn registry(&self) -> &TunnelRegistry {
        &self.registry
    }

    /// The underlying subscription index
    pub fn index(&self) -> &SubscriptionIndex {
        &self.index
    }

    /// Create a tunnel
    pub fn create(&self, id: &str) -> Result<String, RelayError> {
        self.registry.create(id)
    }

    /// Check if a tunnel exists
    pub fn exists(&self, id: &str) -> bool {
        self.registry.exists(id)
    }

    /// Look up a tunnel
    pub fn get(&self, id: &str) -> Result<TunnelSnapshot, RelayError> {
        self.registry.get(id)
    }

    /// Last content of one subchannel
    pub fn content(&self, key: &ChannelKey) -> Result<Option<String>, RelayError> {
        self.registry.content(key.tunnel(), key.subchannel())
    }

    /// History of a tunnel's default subchannel
    pub fn messages(&self, id: &str) -> Result<Vec<String>, RelayError> {
        self.registry.messages(id)
    }

    /// Attach a new subscriber to an existing tunnel
    pub fn subscribe(&self, key: &ChannelKey) -> Result<Subscription, RelayError> {
        if key.tunnel().is_empty() {
            return Err(RelayError::InvalidArgument("tunnel id"));
        }
        if !self.registry.exists(key.tunnel()) {
            return Err(RelayError::NotFound(key.tunnel().to_string()));
        }

        let subscription = self.index.attach(key);
        self.counters.record_attach();

        tracing::debug!(
            channel = %key,
            sink = subscription.id(),
            subscribers = self.index.sink_count(key),
            "Subscriber attached"
        );

        Ok(subscription)
    }

    /// Detach a subscriber
    ///
    /// Safe to call more than once and from any task.
    pub fn unsubscribe(&self, key: &ChannelKey, id: SinkId) {
        if self.index.detach(key, id) {
            self.counters.record_detach();
            tracing::debug!(
                channel = %key,
                sink = id,
                subscribers = self.index.sink_count(key),
                "Subscriber detached"
            );
        }
    }

    /// Publish content and fan it out to the channel's current subscribers
    ///
    /// Registry errors are returned before any delivery. Delivery never
    /// waits: a sink that cannot take the value right now is skipped. Sinks
    /// whose subscription was dropped are removed from the index afterwards.
    pub fn send(&self, key: &ChannelKey, content: &str) -> Result<SendReport, RelayError> {
        let accepted: Arc<str> = self
            .registry
            .publish(key.tunnel(), key.subchannel(), content)?
            .into();

        let sinks = self.index.sinks_for(key);

        let mut report = SendReport::default();
        let mut closed = Vec::new();
        for sink in &sinks {
            match sink.offer(&accepted) {
                Delivery::Delivered => report.delivered += 1,
                Delivery::Full => report.full += 1,
                Delivery::Closed => {
                    report.closed += 1;
                    closed.push(sink.id());
                }
            }
        }

        let pruned = self.index.detach_many(key, &closed);
        for _ in 0..pruned {
            self.counters.record_detach();
        }

        self.counters
            .record_publish(report.delivered as u64, report.skipped() as u64);

        tracing::debug!(
            channel = %key,
            delivered = report.delivered,
            skipped = report.skipped(),
            "Tunnel updated"
        );

        Ok(report)
    }

    /// Relay-wide counters
    pub fn stats(&self) -> RelayStats {
        self.counters.snapshot()
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}
