//! Publish/subscribe fan-out
//!
//! [`SubscriptionIndex`] tracks live sinks per `(tunnel, subchannel)`;
//! [`Relay`] is the broadcast engine that records a publish in the
//! registry and then offers it to every sink attached at that moment.
//!
//! Each sink is a bounded `tokio::sync::mpsc` channel. Delivery uses
//! `try_send`, so a slow consumer loses values instead of stalling the
//! publisher. Late or slow consumers can read the last value back from the
//! registry.

pub mod relay;
pub mod subscription;

pub use relay::{Relay, SendReport};
pub use subscription::{Delivery, Sink, SinkId, Subscription, SubscriptionIndex};
