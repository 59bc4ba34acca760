//! Tunnel registry implementation
//!
//! Owns every tunnel, its per-subchannel content and its history. All state
//! sits behind one lock that is only held for map access, never across an
//! await point or a delivery.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::config::RegistryConfig;
use super::entry::{Tunnel, TunnelSnapshot};
use super::error::RelayError;
use super::key::normalize_subchannel;

/// Central registry for all tunnels
///
/// Read-heavy calls (`exists`, `content`, `messages`) share the lock;
/// `create` and `publish` take it exclusively.
pub struct TunnelRegistry {
    /// Map of tunnel ID to tunnel state
    tunnels: RwLock<HashMap<String, Tunnel>>,

    /// Configuration
    config: RegistryConfig,
}

impl TunnelRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            tunnels: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Create a tunnel
    ///
    /// Existence check and insert happen under one write guard, so two
    /// concurrent creates for the same ID can never both succeed.
    pub fn create(&self, id: &str) -> Result<String, RelayError> {
        if id.is_empty() {
            return Err(RelayError::InvalidArgument("tunnel id"));
        }

        let mut tunnels = self.tunnels.write();
        if tunnels.contains_key(id) {
            return Err(RelayError::AlreadyExists(id.to_string()));
        }
        tunnels.insert(id.to_string(), Tunnel::new(id.to_string(), &self.config));
        drop(tunnels);

        tracing::info!(tunnel = %id, "Tunnel created");
        Ok(id.to_string())
    }

    /// Look up a tunnel, returning an owned snapshot
    pub fn get(&self, id: &str) -> Result<TunnelSnapshot, RelayError> {
        self.tunnels
            .read()
            .get(id)
            .map(Tunnel::snapshot)
            .ok_or_else(|| RelayError::NotFound(id.to_string()))
    }

    /// Check if a tunnel exists
    pub fn exists(&self, id: &str) -> bool {
        self.tunnels.read().contains_key(id)
    }

    /// Record a publish
    ///
    /// Returns the accepted content for fan-out. Concurrent publishes to the
    /// same subchannel are last-writer-wins in lock acquisition order. An
    /// empty subchannel is stored under the default subchannel.
    pub fn publish(
        &self,
        id: &str,
        subchannel: &str,
        content: &str,
    ) -> Result<String, RelayError> {
        if id.is_empty() {
            return Err(RelayError::InvalidArgument("tunnel id"));
        }
        if content.is_empty() {
            return Err(RelayError::InvalidArgument("content"));
        }

        let mut tunnels = self.tunnels.write();
        let tunnel = tunnels
            .get_mut(id)
            .ok_or_else(|| RelayError::NotFound(id.to_string()))?;
        tunnel.record(normalize_subchannel(Some(subchannel)), content);

        Ok(content.to_string())
    }

    /// Last content of one subchannel
    ///
    /// `Ok(None)` means the tunnel exists but nothing was published there yet.
    pub fn content(&self, id: &str, subchannel: &str) -> Result<Option<String>, RelayError> {
        let tunnels = self.tunnels.read();
        let tunnel = tunnels
            .get(id)
            .ok_or_else(|| RelayError::NotFound(id.to_string()))?;
        Ok(tunnel
            .content(normalize_subchannel(Some(subchannel)))
            .map(str::to_string))
    }

    /// Copy of a tunnel's history, oldest first
    pub fn messages(&self, id: &str) -> Result<Vec<String>, RelayError> {
        self.tunnels
            .read()
            .get(id)
            .map(Tunnel::messages)
            .ok_or_else(|| RelayError::NotFound(id.to_string()))
    }

    /// Get total number of tunnels
    pub fn tunnel_count(&self) -> usize {
        self.tunnels.read().len()
    }
}

impl Default for TunnelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
