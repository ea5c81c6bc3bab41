//! Mock server backend running the real binary in a child process
//!
//! This is the shape the scenario under test prescribes: the server is
//! started before the scenario and terminated with an unconditional kill
//! afterwards. Readiness is detected by polling `GET /stats` within a
//! bounded window instead of a fixed sleep.

use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;

use eyre::{eyre, Result, WrapErr};
use tokio::time::Instant;
use tracing::debug;

use apimock_core::{ResponsePolicy, ServerConfig};

use super::Api;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);
const READY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ServerProcess {
    child: Child,
}

/// Path of the `apimock-server` binary
///
/// `APIMOCK_SERVER_BIN` overrides the workspace target directory lookup.
pub fn binary_path() -> PathBuf {
    match std::env::var_os("APIMOCK_SERVER_BIN") {
        Some(path) => path.into(),
        None => assert_cmd::cargo::cargo_bin("apimock-server"),
    }
}

pub async fn start(config: &ServerConfig) -> Result<(ServerProcess, Api)> {
    let mut cmd = Command::new(binary_path());
    cmd.arg("-host")
        .arg(&config.host)
        .arg("-port")
        .arg(config.port.to_string());
    match &config.policy {
        ResponsePolicy::AlwaysOk => {}
        ResponsePolicy::FailNThenOk { n, status } => {
            cmd.arg("-fail-first")
                .arg(n.to_string())
                .arg("-fail-status")
                .arg(status.to_string());
        }
        ResponsePolicy::Custom(_) => {
            return Err(eyre!("custom policies cannot cross a process boundary"));
        }
    }

    let child = cmd.spawn().wrap_err("failed to spawn apimock-server")?;
    debug!("spawned apimock-server (pid {})", child.id());
    let mut process = ServerProcess { child };

    let api = Api::new(&config.host, config.port)?;
    let deadline = Instant::now() + READY_TIMEOUT;
    loop {
        if api.get_stats().await.is_ok() {
            break;
        }
        if let Some(status) = process.child.try_wait()? {
            return Err(eyre!("apimock-server exited during startup: {status}"));
        }
        if Instant::now() >= deadline {
            process.kill();
            return Err(eyre!("apimock-server not ready within {READY_TIMEOUT:?}"));
        }
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }

    Ok((process, api))
}

impl ServerProcess {
    /// Terminate the server unconditionally
    ///
    /// No graceful handshake: the log is in-memory only, nothing needs to be
    /// flushed.
    pub fn kill(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
