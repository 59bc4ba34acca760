//! Streaming connection state machine
//!
//! Tracks one subscriber connection from attach to close.

/// Lifecycle of a streaming connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// Request accepted, sink not attached yet
    Connecting,
    /// Sink attached, values are being forwarded
    Streaming,
    /// Sink detached (terminal)
    Closed,
}

impl StreamPhase {
    /// Attach succeeded
    pub fn on_attached(self) -> Self {
        match self {
            StreamPhase::Connecting => StreamPhase::Streaming,
            other => other,
        }
    }

    /// Attach failed, client gone, or server shutting down
    pub fn on_closed(self) -> Self {
        StreamPhase::Closed
    }

    /// Whether the sink is still attached
    pub fn is_streaming(self) -> bool {
        self == StreamPhase::Streaming
    }
}
