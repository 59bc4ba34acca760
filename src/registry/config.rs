//! Registry configuration

/// Default number of history entries kept per tunnel
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Default number of undelivered values a sink can hold
pub const DEFAULT_SINK_CAPACITY: usize = 16;

/// Configuration for the tunnel registry and its subscription index
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum history entries per tunnel; oldest are dropped first.
    /// `None` keeps every message.
    pub history_limit: Option<usize>,

    /// Buffer slots per subscriber sink. A sink with no free slot is
    /// skipped for that publish.
    pub sink_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            history_limit: Some(DEFAULT_HISTORY_LIMIT),
            sink_capacity: DEFAULT_SINK_CAPACITY,
        }
    }
}

impl RegistryConfig {
    /// Set the history limit (`None` = unbounded)
    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    /// Set the per-sink buffer capacity (minimum 1)
    pub fn sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();

        assert_eq!(config.history_limit, Some(DEFAULT_HISTORY_LIMIT));
        assert_eq!(config.sink_capacity, DEFAULT_SINK_CAPACITY);
    }

    #[test]
    fn test_builder_sink_capacity_floor() {
        let config = RegistryConfig::default().sink_capacity(0);

        assert_eq!(config.sink_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .history_limit(None)
            .sink_capacity(4);

        assert_eq!(config.history_limit, None);
        assert_eq!(config.sink_capacity, 4);
    }
}
