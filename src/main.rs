//! txtrelay server binary
//!
//! Run with: txtrelay [--bind ADDR] [--keepalive-secs N]

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

use txtrelay::{RegistryConfig, RelayServer, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "txtrelay", version, about = "Real-time text relay over server-sent events")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "TXTRELAY_BIND", default_value = "0.0.0.0:2427")]
    bind: SocketAddr,

    /// History entries kept per tunnel (0 = unbounded)
    #[arg(long, env = "TXTRELAY_HISTORY_LIMIT", default_value_t = 1000)]
    history_limit: usize,

    /// Buffered values per subscriber before values are skipped
    #[arg(long, env = "TXTRELAY_SINK_CAPACITY", default_value_t = 16)]
    sink_capacity: usize,

    /// Seconds between keepalive heartbeats (0 = disabled)
    #[arg(long, env = "TXTRELAY_KEEPALIVE_SECS", default_value_t = 600)]
    keepalive_secs: u64,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let history_limit = (self.history_limit > 0).then_some(self.history_limit);
        let registry = RegistryConfig::default()
            .history_limit(history_limit)
            .sink_capacity(self.sink_capacity);

        ServerConfig::default()
            .bind(self.bind)
            .registry(registry)
            .keepalive_period(Duration::from_secs(self.keepalive_secs))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("txtrelay=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = Args::parse().into_config();
    let server = RelayServer::new(config);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
