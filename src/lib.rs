//! txtrelay: a minimal real-time text relay
//!
//! Producers publish text into named tunnels; any number of consumers
//! follow a tunnel (or one of its subchannels) over server-sent events.
//!
//! ```text
//!   POST /send ──► Relay::send ──► TunnelRegistry::publish
//!                       │
//!                       └──► SubscriptionIndex::sinks_for ──► try_send ──► SSE
//! ```
//!
//! The registry and the subscription index are guarded by separate locks
//! and never held together; delivery runs with no lock held.

pub mod error;
pub mod keepalive;
pub mod pubsub;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use keepalive::{KeepaliveConfig, KeepaliveHandle, KeepaliveScheduler};
pub use pubsub::{Relay, SendReport, Subscription};
pub use registry::{ChannelKey, RegistryConfig, RelayError, TunnelRegistry, DEFAULT_SUBCHANNEL};
pub use server::{RelayServer, ServerConfig};
pub use stats::RelayStats;
