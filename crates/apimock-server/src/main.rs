//! Mock API server binary
//!
//! Launched as a subprocess by the test harness and terminated with an
//! unconditional kill; there is no graceful-shutdown handshake because the
//! request log is never persisted.

#![warn(missing_docs)]

use std::path::PathBuf;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use apimock_core::ServerConfig;
use apimock_server::policy_file::PolicySettings;
use apimock_server::MockServer;

/// Command line options
#[derive(Debug)]
struct Opts {
    /// Configuration of the mock server
    config: ServerConfig,

    /// Number of HTTP worker threads
    threads: u32,
}

impl Opts {
    fn from_args() -> Self {
        let mut port: u16 = 8080;
        let mut host = String::from("127.0.0.1");
        let mut threads: u32 = 4;
        let mut fail_first: Option<u64> = None;
        let mut fail_status: Option<u16> = None;
        let mut policy_file: Option<PathBuf> = None;

        let mut option: Option<String> = None;
        for arg in std::env::args().skip(1) {
            if let Some(opt) = option {
                match opt.as_str() {
                    "-port" => port = arg.parse().expect("-port takes a decimal u16"),
                    "-host" => host = arg,
                    "-threads" => threads = arg.parse().expect("-threads takes a decimal u32"),
                    "-fail-first" => {
                        fail_first = Some(arg.parse().expect("-fail-first takes a decimal u64"))
                    }
                    "-fail-status" => {
                        fail_status = Some(arg.parse().expect("-fail-status takes a decimal u16"))
                    }
                    "-policy-file" => policy_file = Some(PathBuf::from(arg)),
                    _ => {
                        eprintln!("Error: unknown option {opt}");
                        std::process::exit(1);
                    }
                }
                option = None;
            } else {
                option = Some(arg);
            }
        }
        if let Some(opt) = option {
            eprintln!("Error: option {opt} is missing its value");
            std::process::exit(1);
        }

        let mut settings = match policy_file {
            Some(path) => PolicySettings::load(&path).unwrap_or_else(|err| {
                eprintln!("Error: {err}");
                std::process::exit(1);
            }),
            None => PolicySettings::default(),
        };
        // explicit flags win over the policy file
        if let Some(n) = fail_first {
            settings.fail_first = n;
        }
        if let Some(status) = fail_status {
            settings.fail_status = status;
        }

        Opts {
            config: ServerConfig {
                host,
                port,
                policy: settings.into_policy(),
            },
            threads,
        }
    }
}

fn main() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let opts = Opts::from_args();

    let server = match MockServer::bind(&opts.config) {
        Ok(server) => server,
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };

    info!(
        "mock API server listening on {} with policy {:?}",
        server.local_addr(),
        opts.config.policy
    );
    server.run(opts.threads);
}
