//! Error types for the server and client entry points.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can stop the server.
///
/// There is no fatal error during normal operation: malformed payloads are
/// dropped per message and stale sends are skipped per recipient. The only
/// unrecoverable conditions are around the listening socket itself.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// The accept loop failed.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A send was attempted while the transport has no open connection.
    /// Messages are rejected during the reconnect gap, never buffered.
    #[error("not connected to the server")]
    NotConnected,

    /// The input line editor failed.
    #[error("readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}
