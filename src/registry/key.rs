//! Channel addressing
//!
//! Publishes and subscriptions are scoped to a `(tunnel, subchannel)` pair.
//! Internally the subchannel is always present; callers that omit it get
//! [`DEFAULT_SUBCHANNEL`].

/// Subchannel used when a caller does not name one
pub const DEFAULT_SUBCHANNEL: &str = "default";

/// Map an optional, possibly empty subchannel name onto the internal key
pub fn normalize_subchannel(subchannel: Option<&str>) -> &str {
    match subchannel {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_SUBCHANNEL,
    }
}

/// Identifies one subchannel of one tunnel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    tunnel: String,
    /// Never empty
    subchannel: String,
}

impl ChannelKey {
    /// Create a new channel key
    ///
    /// An empty subchannel is replaced by [`DEFAULT_SUBCHANNEL`].
    pub fn new(tunnel: impl Into<String>, subchannel: impl Into<String>) -> Self {
        let subchannel = subchannel.into();
        Self {
            tunnel: tunnel.into(),
            subchannel: if subchannel.is_empty() {
                DEFAULT_SUBCHANNEL.to_string()
            } else {
                subchannel
            },
        }
    }

    /// Key for the default subchannel of a tunnel
    pub fn default_of(tunnel: impl Into<String>) -> Self {
        Self::new(tunnel, DEFAULT_SUBCHANNEL)
    }

    /// Tunnel ID
    pub fn tunnel(&self) -> &str {
        &self.tunnel
    }

    /// Subchannel name, never empty
    pub fn subchannel(&self) -> &str {
        &self.subchannel
    }
}

impl std::fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.tunnel, self.subchannel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_subchannel_is_default() {
        let key = ChannelKey::new("room1", "");
        assert_eq!(key.subchannel(), DEFAULT_SUBCHANNEL);
        assert_eq!(key.tunnel(), "room1");
        assert_eq!(key, ChannelKey::default_of("room1"));
    }

    #[test]
    fn test_normalize_subchannel() {
        assert_eq!(normalize_subchannel(None), DEFAULT_SUBCHANNEL);
        assert_eq!(normalize_subchannel(Some("")), DEFAULT_SUBCHANNEL);
        assert_eq!(normalize_subchannel(Some("chat")), "chat");
    }

    #[test]
    fn test_display() {
        assert_eq!(ChannelKey::new("room1", "chat").to_string(), "room1/chat");
    }
}
