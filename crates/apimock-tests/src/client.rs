//! Stand-in retrying client
//!
//! The HTTP client library whose backoff timing is under validation lives
//! outside this repository. This module is a minimal stand-in with the same
//! observable shape, exponential backoff with non-negative jitter on 503, so
//! the oracle scenarios can be exercised end to end. The floor formula is a
//! parameter, not a constant: tests pass whatever curve the external
//! client's documented policy prescribes.

use std::time::Duration;

use eyre::{eyre, Result};
use rand::{thread_rng, Rng};
use reqwest::StatusCode;
use tracing::debug;

/// Exponential-backoff-with-jitter schedule
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay floor before the first retry; doubles per attempt
    pub base: Duration,
    /// Give up after this many attempts
    pub max_attempts: u32,
    /// Jitter added on top of the floor, as a fraction of it (0.0..=1.0)
    pub jitter_frac: f64,
}

impl BackoffPolicy {
    /// Deterministic lower bound for the delay before retry `attempt`
    pub fn floor(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor)
    }

    /// Randomized delay: the floor plus non-negative jitter
    ///
    /// Jitter is strictly additive so measured intervals can exceed the
    /// floor but never undercut it.
    pub fn delay(&self, attempt: u32) -> Duration {
        let floor = self.floor(attempt);
        let frac = thread_rng().gen_range(0.0..=self.jitter_frac);
        floor + floor.mul_f64(frac)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            base: Duration::from_secs(1),
            max_attempts: 10,
            jitter_frac: 0.5,
        }
    }
}

/// Outcome of a retried request
#[derive(Debug)]
pub struct Outcome {
    /// Final status, the first one that was not 503
    pub status: StatusCode,
    /// Total attempts issued, the final one included
    pub attempts: u32,
}

/// HTTP client that retries 503 responses on a [`BackoffPolicy`] schedule
pub struct RetryingClient {
    http: reqwest::Client,
    policy: BackoffPolicy,
}

impl RetryingClient {
    pub fn new(policy: BackoffPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(RetryingClient { http, policy })
    }

    /// POST to `url` until the answer is not 503
    ///
    /// 503 carries no `Retry-After` in this scenario, so the wait between
    /// attempts comes entirely from the policy.
    pub async fn post_with_retry(&self, url: &str) -> Result<Outcome> {
        for attempt in 0..self.policy.max_attempts {
            let resp = self.http.post(url).send().await?;
            let status = resp.status();
            if status != StatusCode::SERVICE_UNAVAILABLE {
                return Ok(Outcome {
                    status,
                    attempts: attempt + 1,
                });
            }

            let delay = self.policy.delay(attempt);
            debug!("503 from {url}, retrying in {delay:?}");
            tokio::time::sleep(delay).await;
        }
        Err(eyre!(
            "still unavailable after {} attempts",
            self.policy.max_attempts
        ))
    }
}
