//! Mock API server for exercising client-side retry behavior
//!
//! Accepts HTTP requests on a configurable port and answers them according to
//! a [`ResponsePolicy`]. Every request outside of `GET /stats` is appended to
//! a timestamped [`RequestLog`]; `GET /stats` serves that log as JSON so a
//! test can reconstruct the client's retry timing.
#![warn(missing_docs)]

mod http;
pub mod policy_file;

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use thiserror::Error;
use tracing::debug;

use apimock_core::{RequestLog, ResponsePolicy, ServerConfig};

/// Failure to bind the listening socket
///
/// A port that is already in use must abort startup: the test's correctness
/// depends on a known port number, so silently serving elsewhere is not an
/// option.
#[derive(Debug, Error)]
#[error("failed to bind {addr}: {reason}")]
pub struct BindError {
    /// Address that could not be bound
    pub addr: String,
    /// Underlying reason reported by the listener
    pub reason: String,
}

/// A bound, not yet running mock server
pub struct MockServer {
    server: Arc<tiny_http::Server>,
    log: Arc<RequestLog>,
    policy: Arc<ResponsePolicy>,
    local_addr: SocketAddr,
}

impl MockServer {
    /// Bind the listening socket described by `config`
    pub fn bind(config: &ServerConfig) -> Result<Self, BindError> {
        let addr = format!("{}:{}", config.host, config.port);
        let server =
            tiny_http::Server::http((config.host.as_str(), config.port)).map_err(|err| {
                BindError {
                    addr: addr.clone(),
                    reason: err.to_string(),
                }
            })?;
        let local_addr = server.server_addr().to_ip().ok_or_else(|| BindError {
            addr,
            reason: String::from("listener has no IP address"),
        })?;

        Ok(MockServer {
            server: Arc::new(server),
            log: Arc::new(RequestLog::new()),
            policy: Arc::new(config.policy.clone()),
            local_addr,
        })
    }

    /// Address the server actually listens on
    ///
    /// Differs from the configured address only when port 0 was requested.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests on `threads` scoped threads until the process dies
    ///
    /// This is the blocking entry point used by the binary; the process is
    /// expected to be terminated by an unconditional kill from the parent.
    pub fn run(&self, threads: u32) {
        thread::scope(|s| {
            for i in 0..threads {
                thread::Builder::new()
                    .name(format!("apimock_http_{i}"))
                    .spawn_scoped(s, || http_loop(&self.server, &self.log, &self.policy))
                    .expect("failed to spawn HTTP thread");
            }
        });
    }

    /// Serve requests on `threads` background threads
    ///
    /// Used by tests that embed the server in their own process; the returned
    /// handle shuts the accept loops down again.
    pub fn spawn(self, threads: u32) -> MockServerHandle {
        let mut joins = Vec::with_capacity(threads as usize);
        for i in 0..threads {
            let server = self.server.clone();
            let log = self.log.clone();
            let policy = self.policy.clone();
            let join = thread::Builder::new()
                .name(format!("apimock_http_{i}"))
                .spawn(move || http_loop(&server, &log, &policy))
                .expect("failed to spawn HTTP thread");
            joins.push(join);
        }

        MockServerHandle {
            server: self.server,
            local_addr: self.local_addr,
            joins,
        }
    }
}

/// Handle to a mock server running on background threads
pub struct MockServerHandle {
    server: Arc<tiny_http::Server>,
    local_addr: SocketAddr,
    joins: Vec<thread::JoinHandle<()>>,
}

impl MockServerHandle {
    /// Address the server listens on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop the accept loops and wait for them to terminate
    pub fn shutdown(self) {
        // one unblock per thread stuck in recv()
        for _ in &self.joins {
            self.server.unblock();
        }
        for join in self.joins {
            let _ = join.join();
        }
    }
}

fn http_loop(server: &tiny_http::Server, log: &RequestLog, policy: &ResponsePolicy) {
    loop {
        let rq = match server.recv() {
            Ok(rq) => rq,
            Err(err) => {
                debug!("HTTP loop exiting: {err}");
                break;
            }
        };
        http::handle(rq, log, policy);
    }
}
