//! Mock server backend running inside the test process
//!
//! Binds the `apimock-server` library directly, usually on port 0, so tests
//! get a fresh server without any port coordination.

use eyre::Result;
use tokio::task;

use apimock_core::ServerConfig;
use apimock_server::{MockServer, MockServerHandle};

use super::Api;

const HTTP_THREADS: u32 = 4;

pub struct EmbeddedServer {
    handle: MockServerHandle,
}

pub async fn start(config: ServerConfig) -> Result<(EmbeddedServer, Api)> {
    let handle =
        task::spawn_blocking(move || MockServer::bind(&config).map(|s| s.spawn(HTTP_THREADS)))
            .await??;

    let addr = handle.local_addr();
    let api = Api::new(&addr.ip().to_string(), addr.port())?;
    Ok((EmbeddedServer { handle }, api))
}

impl EmbeddedServer {
    pub async fn shutdown(self) {
        task::spawn_blocking(move || self.handle.shutdown())
            .await
            .unwrap();
    }
}
