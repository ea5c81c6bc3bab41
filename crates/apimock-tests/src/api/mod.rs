use std::time::Duration;

use eyre::Result;
use reqwest::StatusCode;
use thiserror::Error;

use apimock_core::RequestRecord;

pub mod embedded;
pub mod subprocess;

/// The log-inspection route answered with something other than 200
#[derive(Debug, Error)]
#[error("GET /stats returned status {0}")]
pub struct StatsError(pub StatusCode);

/// HTTP client for the mock server's wire protocol
#[derive(Clone)]
pub struct Api {
    http: reqwest::Client,
    base_url: String,
}

impl Api {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Api {
            http,
            base_url: format!("http://{host}:{port}"),
        })
    }

    /// Absolute URL for a path on the mock server
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Fetch the request log from `GET /stats`
    ///
    /// Read-only: the mock never appends a record for this route.
    pub async fn get_stats(&self) -> Result<Vec<RequestRecord>> {
        let resp = self.http.get(self.url("/stats")).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(StatsError(resp.status()).into());
        }
        Ok(resp.json().await?)
    }

    /// Issue a single POST without any retry logic
    ///
    /// Returns whatever status the policy produced, 503 included.
    pub async fn post(&self, path: &str) -> Result<(StatusCode, String)> {
        let resp = self.post_raw(path).await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok((status, body))
    }

    /// Like [`Self::post`], but hands back the full response for header
    /// inspection
    pub async fn post_raw(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.http.post(self.url(path)).send().await?)
    }
}
