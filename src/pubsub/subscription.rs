//! Subscription index
//!
//! Tracks which sinks are attached to which `(tunnel, subchannel)` pair.
//! The index keeps only the sending half of each sink; the receiving half
//! is the [`Subscription`] owned by the streaming connection. Dropping the
//! subscription closes the sink even if it is still indexed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::registry::ChannelKey;

/// Identity of one attached sink
pub type SinkId = u64;

/// Outcome of offering a value to one sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Value queued for the consumer
    Delivered,
    /// Consumer's buffer is full; value skipped
    Full,
    /// Consumer is gone; value skipped
    Closed,
}

/// Index-side handle for one subscriber
#[derive(Debug, Clone)]
pub struct Sink {
    id: SinkId,
    tx: mpsc::Sender<Arc<str>>,
}

impl Sink {
    /// Sink identity
    pub fn id(&self) -> SinkId {
        self.id
    }

    /// Offer a value without waiting
    pub fn offer(&self, content: &Arc<str>) -> Delivery {
        match self.tx.try_send(Arc::clone(content)) {
            Ok(()) => Delivery::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Full,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}

/// Consumer-side handle for one subscriber
///
/// Owned by the streaming connection that attached it.
#[derive(Debug)]
pub struct Subscription {
    id: SinkId,
    key: ChannelKey,
    rx: mpsc::Receiver<Arc<str>>,
}

impl Subscription {
    /// Sink identity, used to detach
    pub fn id(&self) -> SinkId {
        self.id
    }

    /// The channel this subscription is attached to
    pub fn key(&self) -> &ChannelKey {
        &self.key
    }

    /// Wait for the next value
    ///
    /// Returns `None` once the sink has been detached and drained.
    pub async fn recv(&mut self) -> Option<Arc<str>> {
        self.rx.recv().await
    }

    /// Take a queued value, if any
    pub fn try_recv(&mut self) -> Option<Arc<str>> {
        self.rx.try_recv().ok()
    }
}

type Buckets = HashMap<String, HashMap<String, Vec<Sink>>>;

/// Map of tunnel -> subchannel -> attached sinks
///
/// Guarded by its own lock, independent of the registry's.
pub struct SubscriptionIndex {
    sinks: RwLock<Buckets>,
    next_sink_id: AtomicU64,
    capacity: usize,
}

impl SubscriptionIndex {
    /// Create an index whose sinks buffer `capacity` values
    pub fn new(capacity: usize) -> Self {
        Self {
            sinks: RwLock::new(HashMap::new()),
            next_sink_id: AtomicU64::new(1),
            capacity: capacity.max(1),
        }
    }

    /// Allocate a sink and register it under `key`
    ///
    /// Does not check that the tunnel exists; [`crate::pubsub::Relay`] does.
    pub fn attach(&self, key: &ChannelKey) -> Subscription {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = self.next_sink_id.fetch_add(1, Ordering::Relaxed);

        self.sinks
            .write()
            .entry(key.tunnel().to_string())
            .or_default()
            .entry(key.subchannel().to_string())
            .or_default()
            .push(Sink { id, tx });

        Subscription {
            id,
            key: key.clone(),
            rx,
        }
    }

    /// Remove a sink
    ///
    /// Unknown keys or IDs are ignored. Returns whether a sink was removed.
    pub fn detach(&self, key: &ChannelKey, id: SinkId) -> bool {
        self.detach_many(key, &[id]) == 1
    }

    /// Remove several sinks of one channel under a single lock acquisition
    ///
    /// Returns how many were actually removed.
    pub fn detach_many(&self, key: &ChannelKey, ids: &[SinkId]) -> usize {
        if ids.is_empty() {
            return 0;
        }
        let mut sinks = self.sinks.write();

        let Some(subchannels) = sinks.get_mut(key.tunnel()) else {
            return 0;
        };
        let Some(bucket) = subchannels.get_mut(key.subchannel()) else {
            return 0;
        };

        let before = bucket.len();
        bucket.retain(|sink| !ids.contains(&sink.id));
        let removed = before - bucket.len();

        if bucket.is_empty() {
            subchannels.remove(key.subchannel());
        }
        if subchannels.is_empty() {
            sinks.remove(key.tunnel());
        }

        removed
    }

    /// Point-in-time copy of the sinks attached to `key`
    pub fn sinks_for(&self, key: &ChannelKey) -> Vec<Sink> {
        self.sinks
            .read()
            .get(key.tunnel())
            .and_then(|subchannels| subchannels.get(key.subchannel()))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of sinks attached to `key`
    pub fn sink_count(&self, key: &ChannelKey) -> usize {
        self.sinks
            .read()
            .get(key.tunnel())
            .and_then(|subchannels| subchannels.get(key.subchannel()))
            .map_or(0, Vec::len)
    }

    /// Number of sinks attached anywhere in a tunnel
    pub fn tunnel_sink_count(&self, tunnel: &str) -> usize {
        self.sinks
            .read()
            .get(tunnel)
            .map_or(0, |subchannels| subchannels.values().map(Vec::len).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_detach() {
        let index = SubscriptionIndex::new(4);
        let key = ChannelKey::default_of("room1");

        let a = index.attach(&key);
        let b = index.attach(&key);
        assert_ne!(a.id(), b.id());
        assert_eq!(index.sink_count(&key), 2);

        assert!(index.detach(&key, a.id()));
        assert_eq!(index.sink_count(&key), 1);
        assert_eq!(index.sinks_for(&key)[0].id(), b.id());
    }

    #[test]
    fn test_detach_twice_and_unknown() {
        let index = SubscriptionIndex::new(4);
        let key = ChannelKey::default_of("room1");
        let other = index.attach(&key);
        let sub = index.attach(&key);

        assert!(index.detach(&key, sub.id()));
        assert!(!index.detach(&key, sub.id()));
        assert!(!index.detach(&key, 9999));
        assert!(!index.detach(&ChannelKey::new("ghost", "x"), sub.id()));

        assert_eq!(index.sink_count(&key), 1);
        assert_eq!(index.sinks_for(&key)[0].id(), other.id());
    }

    #[test]
    fn test_snapshot_is_not_live() {
        let index = SubscriptionIndex::new(4);
        let key = ChannelKey::default_of("room1");
        let sub = index.attach(&key);

        let snapshot = index.sinks_for(&key);
        index.detach(&key, sub.id());
        let _late = index.attach(&key);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id(), sub.id());
    }

    #[test]
    fn test_empty_buckets_pruned() {
        let index = SubscriptionIndex::new(4);
        let key = ChannelKey::new("room1", "chat");
        let sub = index.attach(&key);
        assert_eq!(index.tunnel_sink_count("room1"), 1);

        index.detach(&key, sub.id());

        assert_eq!(index.tunnel_sink_count("room1"), 0);
        assert!(index.sinks.read().is_empty());
    }

    #[test]
    fn test_detach_many() {
        let index = SubscriptionIndex::new(4);
        let key = ChannelKey::default_of("room1");
        let a = index.attach(&key);
        let b = index.attach(&key);
        let keep = index.attach(&key);

        assert_eq!(index.detach_many(&key, &[a.id(), b.id(), 777]), 2);
        assert_eq!(index.detach_many(&key, &[a.id()]), 0);
        assert_eq!(index.detach_many(&key, &[]), 0);

        assert_eq!(index.sink_count(&key), 1);
        assert_eq!(index.sinks_for(&key)[0].id(), keep.id());
    }

    #[test]
    fn test_offer_full_and_closed() {
        let index = SubscriptionIndex::new(1);
        let key = ChannelKey::default_of("room1");
        let mut sub = index.attach(&key);
        let sink = index.sinks_for(&key).remove(0);
        let value: Arc<str> = Arc::from("x");

        assert_eq!(sink.offer(&value), Delivery::Delivered);
        assert_eq!(sink.offer(&value), Delivery::Full);
        assert_eq!(sub.try_recv().as_deref(), Some("x"));

        drop(sub);
        assert_eq!(sink.offer(&value), Delivery::Closed);
    }
}
