//! WebSocket broadcast chat server.

mod handler;
pub mod registry;
mod signal;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{any, get},
};
use clap::Parser;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use state::AppState;

/// Server configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "banter-server", about = "WebSocket broadcast chat server")]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 3001)]
    pub port: u16,
}

/// Build the router for the given shared state.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", any(handler::websocket_handler))
        .route("/api/health", get(handler::health_check))
        .route("/api/users", get(handler::list_users))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until a shutdown signal arrives.
///
/// The registry lives and dies with this call: purely in-memory, reset on
/// every restart.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| ServerError::Io(std::io::Error::other("invalid host/port")))?;

    let state = Arc::new(AppState::new());
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!("Server is listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(signal::shutdown_signal())
        .await?;

    Ok(())
}
