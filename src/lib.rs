//! WebSocket broadcast chat library.
//!
//! This library provides server and client implementations for a single-room
//! broadcast chat: the server keeps an in-memory registry of named live
//! connections and rebroadcasts every chat message and presence change to all
//! of them; the client renders the stream and optimistically displays its own
//! outgoing messages before the server echo confirms them.

pub mod client;
pub mod error;
pub mod logger;
pub mod protocol;
pub mod server;
pub mod time;

// Re-export entry points
pub use client::run_client;
pub use server::run_server;
