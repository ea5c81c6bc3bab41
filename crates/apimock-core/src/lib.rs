//! 🏗 Data model shared by the mock API server and its test harness
#![warn(missing_docs)]

mod policy;
mod record;

pub use policy::ResponsePolicy;
pub use record::{RequestLog, RequestRecord};

/// Launch configuration of the mock API server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Address to listen on
    pub host: String,
    /// Port to listen on; 0 picks an ephemeral port
    pub port: u16,
    /// Response policy for logged requests
    pub policy: ResponsePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: String::from("127.0.0.1"),
            port: 8080,
            policy: ResponsePolicy::AlwaysOk,
        }
    }
}
