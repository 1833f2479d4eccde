//! CLI chat client with optimistic sends and auto-reconnect.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin banter-client -- --user-id alice
//! ```

use banter::client::ClientConfig;
use banter::logger::setup_logger;
use clap::Parser;

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let config = ClientConfig::parse();

    // Run the client
    if let Err(e) = banter::run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
