//! Shared test fixtures.

use std::time::Duration;

use banter::server::ServerConfig;

/// A real server instance running on a dedicated port for one test.
pub struct TestServer {
    port: u16,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Start the server and wait until it accepts connections.
    pub async fn start(port: u16) -> Self {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
        };
        let handle = tokio::spawn(async move {
            if let Err(e) = banter::run_server(config).await {
                panic!("test server failed: {e}");
            }
        });

        for _ in 0..100 {
            if tokio::net::TcpStream::connect(("127.0.0.1", port))
                .await
                .is_ok()
            {
                return Self { port, handle };
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("test server did not start on port {port}");
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
