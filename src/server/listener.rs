//! Relay HTTP server
//!
//! Binds the listener, starts the keepalive scheduler and serves the router
//! until shut down.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::keepalive::KeepaliveScheduler;
use crate::pubsub::Relay;
use crate::server::config::ServerConfig;
use crate::server::routes::{router, AppState};

/// Relay server
pub struct RelayServer {
    config: ServerConfig,
    relay: Arc<Relay>,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let relay = Arc::new(Relay::with_config(config.registry.clone()));
        Self {
            config,
            relay,
        }
    }

    /// Get a reference to the relay
    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// Build a router whose open streams end when `shutdown` is cancelled
    pub fn router(&self, shutdown: CancellationToken) -> axum::Router {
        router(AppState::new(Arc::clone(&self.relay), shutdown))
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener
    ///
    /// When `shutdown` resolves, open streams are closed, in-flight requests
    /// finish, and the keepalive scheduler is stopped. Each call gets a fresh
    /// stream shutdown token, so an instance can be served again.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tracing::info!(addr = %listener.local_addr()?, "Relay server listening");

        let keepalive = if self.config.keepalive.enabled {
            let scheduler =
                KeepaliveScheduler::new(Arc::clone(&self.relay), self.config.keepalive.clone());
            Some(scheduler.spawn()?)
        } else {
            None
        };

        let token = CancellationToken::new();
        let streams = token.clone();
        let result = axum::serve(listener, self.router(streams))
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
                token.cancel();
            })
            .await;

        if let Some(keepalive) = keepalive {
            keepalive.shutdown().await;
        }

        result?;
        Ok(())
    }
}
