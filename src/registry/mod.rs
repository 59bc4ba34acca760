//! Tunnel registry
//!
//! The registry owns every tunnel: its ID, the last content published to
//! each subchannel, and the default subchannel's history. It knows nothing
//! about subscribers; fan-out lives in [`crate::pubsub`].
//!
//! # Architecture
//!
//! ```text
//!                  Arc<TunnelRegistry>
//!             ┌──────────────────────────┐
//!             │ tunnels: HashMap<Id,     │
//!             │   Tunnel {               │
//!             │     subchannels,         │
//!             │     history,             │
//!             │   }                      │
//!             │ >                        │
//!             └────────────┬─────────────┘
//!                          │
//!          ┌───────────────┼────────────────┐
//!          ▼               ▼                ▼
//!      create()        publish()        get() / messages()
//! ```
//!
//! Tunnels are never removed. IDs are unique for the registry's lifetime.

pub mod config;
pub mod entry;
pub mod error;
pub mod key;
pub mod store;

pub use config::RegistryConfig;
pub use entry::{Tunnel, TunnelSnapshot};
pub use error::RelayError;
pub use key::{normalize_subchannel, ChannelKey, DEFAULT_SUBCHANNEL};
pub use store::TunnelRegistry;
