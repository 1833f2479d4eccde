//! WebSocket broadcast chat server.
//!
//! Receives messages from clients and broadcasts them to all connected
//! clients, the sender included.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin banter-server
//! ```

use banter::logger::setup_logger;
use banter::server::ServerConfig;
use clap::Parser;

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::parse();

    // Run the server
    if let Err(e) = banter::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
