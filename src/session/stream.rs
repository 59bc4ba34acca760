//! Subscriber stream
//!
//! Wraps a [`Subscription`] for one streaming connection. The sink is
//! detached when the client goes away (the stream is dropped), when the
//! server's shutdown token fires, or when [`SubscriberStream::close`] is
//! called, whichever comes first.

use std::sync::Arc;

use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::pubsub::{Relay, Subscription};
use crate::registry::{ChannelKey, RelayError};

use super::state::StreamPhase;

/// One live subscriber connection
pub struct SubscriberStream {
    relay: Arc<Relay>,
    subscription: Subscription,
    shutdown: CancellationToken,
    phase: StreamPhase,
}

impl SubscriberStream {
    /// Attach to `key`
    ///
    /// Fails with `NotFound` if the tunnel does not exist; no sink is left
    /// behind in that case.
    pub fn open(
        relay: Arc<Relay>,
        key: &ChannelKey,
        shutdown: CancellationToken,
    ) -> Result<Self, RelayError> {
        let phase = StreamPhase::Connecting;
        let subscription = relay.subscribe(key)?;

        Ok(Self {
            relay,
            subscription,
            shutdown,
            phase: phase.on_attached(),
        })
    }

    /// Current phase
    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// The channel this stream is attached to
    pub fn key(&self) -> &ChannelKey {
        self.subscription.key()
    }

    /// Wait for the next value or shutdown
    ///
    /// Returns `None` once the stream is closed.
    pub async fn next_message(&mut self) -> Option<Arc<str>> {
        if !self.phase.is_streaming() {
            return None;
        }

        let received = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            msg = self.subscription.recv() => msg,
        };

        if received.is_none() {
            self.close();
        }
        received
    }

    /// Detach the sink; idempotent
    pub fn close(&mut self) {
        if self.phase == StreamPhase::Closed {
            return;
        }
        self.relay
            .unsubscribe(self.subscription.key(), self.subscription.id());
        self.phase = self.phase.on_closed();
    }

    /// Turn into a `Stream` of values, ending on close
    pub fn into_stream(self) -> impl Stream<Item = Arc<str>> + Send + 'static {
        futures::stream::unfold(self, |mut stream| async move {
            let msg = stream.next_message().await?;
            Some((msg, stream))
        })
    }
}

impl Drop for SubscriberStream {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    fn relay_with(id: &str) -> Arc<Relay> {
        let relay = Arc::new(Relay::new());
        relay.create(id).unwrap();
        relay
    }

    #[tokio::test]
    async fn test_open_unknown_tunnel() {
        let relay = Arc::new(Relay::new());

        let result = SubscriberStream::open(
            Arc::clone(&relay),
            &ChannelKey::default_of("nope"),
            CancellationToken::new(),
        );

        assert!(matches!(result, Err(RelayError::NotFound(_))));
        assert_eq!(relay.stats().attaches, 0);
    }

    #[tokio::test]
    async fn test_receives_then_detaches_on_drop() {
        let relay = relay_with("room1");
        let key = ChannelKey::default_of("room1");

        let mut stream =
            SubscriberStream::open(Arc::clone(&relay), &key, CancellationToken::new()).unwrap();
        assert!(stream.phase().is_streaming());
        assert_eq!(relay.index().sink_count(&key), 1);

        relay.send(&key, "hello").unwrap();
        assert_eq!(stream.next_message().await.as_deref(), Some("hello"));

        drop(stream);
        assert_eq!(relay.index().sink_count(&key), 0);
    }

    #[tokio::test]
    async fn test_shutdown_ends_stream() {
        let relay = relay_with("room1");
        let key = ChannelKey::default_of("room1");
        let token = CancellationToken::new();

        let stream = SubscriberStream::open(Arc::clone(&relay), &key, token.clone()).unwrap();
        let mut values = Box::pin(stream.into_stream());

        relay.send(&key, "one").unwrap();
        assert_eq!(values.next().await.as_deref(), Some("one"));

        token.cancel();
        assert!(values.next().await.is_none());
        assert_eq!(relay.index().sink_count(&key), 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let relay = relay_with("room1");
        let key = ChannelKey::default_of("room1");

        let mut stream =
            SubscriberStream::open(Arc::clone(&relay), &key, CancellationToken::new()).unwrap();
        stream.close();
        stream.close();
        drop(stream);

        assert_eq!(relay.stats().detaches, 1);
        assert_eq!(relay.index().sink_count(&key), 0);
    }
}
