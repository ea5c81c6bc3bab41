use std::time::Duration;

use apimock_tests::client::{BackoffPolicy, RetryingClient};
use apimock_tests::{oracle, ResponsePolicy, TestCtxBuilder};
use eyre::Result;

/// Full retry scenario: the server rejects the first N requests with 503 and
/// no Retry-After, the client falls back to its own exponential backoff, and
/// the oracle confirms every measured interval sits on or above the policy
/// floor.
///
/// Runs at a millisecond-scale base so the suite stays fast; the floor
/// formula itself is the parameter under test, not the absolute scale.
#[tokio::test]
#[ntest::timeout(60_000)]
async fn retry_intervals_respect_backoff_floor() -> Result<()> {
    const FAILURES: u64 = 5;
    let policy = BackoffPolicy {
        base: Duration::from_millis(50),
        max_attempts: 8,
        jitter_frac: 0.5,
    };

    let ctx = TestCtxBuilder::from_env()?
        .with_policy(ResponsePolicy::fail_n_then_ok(FAILURES))
        .build()
        .await?;

    let client = RetryingClient::new(policy)?;
    let outcome = client.post_with_retry(&ctx.api.url("/file/new")).await?;
    assert_eq!(outcome.status, 200);
    assert_eq!(outcome.attempts, FAILURES as u32 + 1);

    let stats = ctx.api.get_stats().await?;
    assert!(
        stats.len() >= FAILURES as usize + 1,
        "insufficient attempts recorded: {}",
        stats.len()
    );

    oracle::verify_monotonic(&stats)?;
    oracle::verify_backoff_floor(&stats, 0..FAILURES as usize, |k| {
        policy.floor(k as u32).as_secs_f64()
    })?;

    ctx.finish().await;
    Ok(())
}

/// The 503 responses really carry no Retry-After header; that absence is the
/// whole point of the scenario.
#[tokio::test]
#[ntest::timeout(20_000)]
async fn unavailability_comes_without_retry_after() -> Result<()> {
    let ctx = TestCtxBuilder::from_env()?
        .with_policy(ResponsePolicy::fail_n_then_ok(1))
        .build()
        .await?;

    let resp = ctx.api.post_raw("/file/new").await?;
    assert_eq!(resp.status(), 503);
    assert!(
        resp.headers().get("retry-after").is_none(),
        "the mock must never send Retry-After"
    );

    let resp = ctx.api.post_raw("/file/new").await?;
    assert_eq!(resp.status(), 200);

    ctx.finish().await;
    Ok(())
}

/// A client that gives up early leaves too few records, which the oracle
/// reports as a failure instead of a silent pass.
#[tokio::test]
#[ntest::timeout(30_000)]
async fn early_give_up_fails_the_oracle() -> Result<()> {
    const FAILURES: u64 = 6;

    let ctx = TestCtxBuilder::from_env()?
        .with_policy(ResponsePolicy::fail_n_then_ok(FAILURES))
        .build()
        .await?;

    let client = RetryingClient::new(BackoffPolicy {
        base: Duration::from_millis(10),
        max_attempts: 3,
        jitter_frac: 0.5,
    })?;
    assert!(
        client
            .post_with_retry(&ctx.api.url("/file/new"))
            .await
            .is_err(),
        "three attempts cannot outlast six failures"
    );

    let stats = ctx.api.get_stats().await?;
    let result = oracle::verify_backoff_floor(&stats, 0..FAILURES as usize, |_| 0.0);
    assert_eq!(
        result,
        Err(oracle::OracleError::InsufficientAttempts {
            needed: FAILURES as usize + 1,
            got: stats.len(),
        })
    );

    ctx.finish().await;
    Ok(())
}
