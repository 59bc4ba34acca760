//! Streaming subscriber sessions

pub mod state;
pub mod stream;

pub use state::StreamPhase;
pub use stream::SubscriberStream;
