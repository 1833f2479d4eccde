//! Shared server state.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::registry::Registry;

/// State shared by all connection handlers.
///
/// The registry is created at server start and injected here rather than
/// living as ambient module state, so tests can run against a fresh instance.
pub struct AppState {
    /// One lock acquisition covers each register/deregister/broadcast as a
    /// single critical section.
    pub registry: Arc<Mutex<Registry>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::new())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
