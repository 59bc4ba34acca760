//! Counters for relay activity

use std::sync::atomic::{AtomicU64, Ordering};

/// Live relay counters, updated without locking
#[derive(Debug, Default)]
pub struct RelayCounters {
    publishes: AtomicU64,
    deliveries: AtomicU64,
    dropped_deliveries: AtomicU64,
    attaches: AtomicU64,
    detaches: AtomicU64,
}

impl RelayCounters {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_publish(&self, delivered: u64, dropped: u64) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
        self.deliveries.fetch_add(delivered, Ordering::Relaxed);
        self.dropped_deliveries.fetch_add(dropped, Ordering::Relaxed);
    }

    pub(crate) fn record_attach(&self) {
        self.attaches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_detach(&self) {
        self.detaches.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> RelayStats {
        RelayStats {
            publishes: self.publishes.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            dropped_deliveries: self.dropped_deliveries.load(Ordering::Relaxed),
            attaches: self.attaches.load(Ordering::Relaxed),
            detaches: self.detaches.load(Ordering::Relaxed),
        }
    }
}

/// Relay-wide statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Accepted publishes
    pub publishes: u64,
    /// Values handed to a sink
    pub deliveries: u64,
    /// Values skipped because the sink was full or closed
    pub dropped_deliveries: u64,
    /// Sinks attached
    pub attaches: u64,
    /// Sinks detached
    pub detaches: u64,
}

impl RelayStats {
    /// Sinks currently attached according to the counters
    pub fn active_subscribers(&self) -> u64 {
        self.attaches.saturating_sub(self.detaches)
    }
}
