//! HTTP server
//!
//! axum front end for the relay: routing, CORS, error mapping and the
//! server-sent-events stream endpoint.

pub mod config;
pub mod error;
pub mod listener;
pub mod routes;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use listener::RelayServer;
pub use routes::{router, AppState};
