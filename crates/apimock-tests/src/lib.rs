//! Test harness for the mock API server
//!
//! Provides a [`TestCtx`] wrapping a running mock server (embedded in the
//! test process or spawned as a subprocess), an [`Api`] client for the wire
//! protocol, the retry-timing [`oracle`], and a stand-in retrying
//! [`client`] for exercising backoff scenarios end to end.

use eyre::Result;

mod api;
pub mod client;
pub mod oracle;

pub use api::subprocess::binary_path as server_binary_path;
pub use api::{Api, StatsError};
pub use apimock_core::{RequestRecord, ResponsePolicy, ServerConfig};

/// How to run the mock server for a test
#[derive(Clone, Copy, Debug)]
pub enum RunCfg {
    /// Bind the server library inside the test process
    Embedded,
    /// Spawn the real binary and kill it on teardown
    Subprocess,
}

pub struct TestCtxBuilder {
    /// Address the server listens on
    pub host: String,
    /// Port to listen on; 0 picks an ephemeral port (embedded only)
    pub port: u16,
    /// Response policy for logged requests
    pub policy: ResponsePolicy,

    pub run_cfg: RunCfg,
}

impl TestCtxBuilder {
    /// Create a builder initialized with environment defaults
    ///
    /// `APIMOCK_RUN=subprocess` selects the subprocess backend for every
    /// test that does not override it.
    pub fn from_env() -> Result<Self> {
        let run_cfg = match std::env::var("APIMOCK_RUN") {
            Ok(v) if v.eq_ignore_ascii_case("subprocess") => RunCfg::Subprocess,
            _ => RunCfg::Embedded,
        };

        Ok(TestCtxBuilder {
            host: String::from("127.0.0.1"),
            port: 0,
            policy: ResponsePolicy::AlwaysOk,
            run_cfg,
        })
    }

    /// Set the listening port (required for the subprocess backend)
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the response policy
    pub fn with_policy(mut self, policy: ResponsePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Force the subprocess backend regardless of the environment
    pub fn subprocess(mut self) -> Self {
        self.run_cfg = RunCfg::Subprocess;
        self
    }

    /// Get the [`ServerConfig`] for launching the mock server
    fn config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
            policy: self.policy.clone(),
        }
    }

    /// Build the test context
    pub async fn build(self) -> Result<TestCtx> {
        let config = self.config();
        let (backend, api) = match self.run_cfg {
            RunCfg::Embedded => {
                let (server, api) = api::embedded::start(config).await?;
                (Backend::Embedded(server), api)
            }
            RunCfg::Subprocess => {
                eyre::ensure!(
                    config.port != 0,
                    "the subprocess backend needs a fixed port; use with_port()"
                );
                let (process, api) = api::subprocess::start(&config).await?;
                (Backend::Subprocess(process), api)
            }
        };

        Ok(TestCtx {
            api,
            backend,
            drop_bomb: DropBomb,
        })
    }
}

enum Backend {
    Embedded(api::embedded::EmbeddedServer),
    Subprocess(api::subprocess::ServerProcess),
}

/// Test context
pub struct TestCtx {
    /// API allowing to interact with the mock server
    pub api: Api,
    backend: Backend,

    drop_bomb: DropBomb,
}

impl TestCtx {
    /// Shut down the mock server and finish the test
    pub async fn finish(self) {
        std::mem::forget(self.drop_bomb);
        drop(self.api);
        match self.backend {
            Backend::Embedded(server) => server.shutdown().await,
            Backend::Subprocess(process) => process.kill(),
        }
    }
}

struct DropBomb;

impl Drop for DropBomb {
    fn drop(&mut self) {
        eprintln!("@TestAuthor: You should call `ctx.finish().await` to shut the mock server down");
    }
}
