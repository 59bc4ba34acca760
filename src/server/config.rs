//! Server configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::keepalive::KeepaliveConfig;
use crate::registry::RegistryConfig;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 2427;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Registry and sink settings
    pub registry: RegistryConfig,

    /// Heartbeat settings
    pub keepalive: KeepaliveConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            registry: RegistryConfig::default(),
            keepalive: KeepaliveConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the registry configuration
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }

    /// Set the keepalive period; zero disables the scheduler
    pub fn keepalive_period(mut self, period: Duration) -> Self {
        if period.is_zero() {
            self.keepalive = self.keepalive.disable();
        } else {
            self.keepalive = self.keepalive.period(period);
        }
        self
    }
}
