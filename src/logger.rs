//! Logging setup shared by the server and client binaries.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence when set; otherwise the given binary and this
/// crate log at `default_level`, with tower-http request traces enabled.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let default_filter = format!(
        "{}={default_level},banter={default_level},tower_http={default_level}",
        bin_name.replace('-', "_")
    );
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
