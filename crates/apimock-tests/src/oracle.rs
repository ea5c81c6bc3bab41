//! Timing oracle
//!
//! Validates the retry spacing recorded in the mock server's request log
//! against a policy's deterministic floor. Only the lower bound is checked:
//! the client is expected to add positive jitter, so intervals may exceed
//! the floor but must never fall below it.

use std::ops::Range;

use thiserror::Error;

use apimock_core::RequestRecord;

/// A timing assertion failed
///
/// These are test-assertion failures, distinct from any server-side fault.
#[derive(Debug, Error, PartialEq)]
pub enum OracleError {
    /// The log is too short for the requested window
    #[error("insufficient attempts recorded: window needs {needed} records, log has {got}")]
    InsufficientAttempts { needed: usize, got: usize },

    /// A record carries an earlier timestamp than its predecessor
    #[error("timestamp of record {index} precedes its predecessor")]
    NonMonotonic { index: usize },

    /// An inter-arrival interval undercut the policy floor
    #[error("interval {index} lasted {measured:.3}s, below the {floor:.3}s floor")]
    BelowFloor {
        index: usize,
        measured: f64,
        floor: f64,
    },
}

/// Inter-arrival intervals in seconds
///
/// `intervals(records)[i]` is the time between records `i` and `i + 1`.
pub fn intervals(records: &[RequestRecord]) -> Vec<f64> {
    records
        .windows(2)
        .map(|w| seconds_between(&w[0], &w[1]))
        .collect()
}

/// Check that timestamps never go backwards (arrival order is server order)
pub fn verify_monotonic(records: &[RequestRecord]) -> Result<(), OracleError> {
    for (i, w) in records.windows(2).enumerate() {
        if w[1].timestamp < w[0].timestamp {
            return Err(OracleError::NonMonotonic { index: i + 1 });
        }
    }
    Ok(())
}

/// Check measured intervals against a backoff policy's deterministic floor
///
/// `window` indexes intervals: interval `i` spans records `i` and `i + 1`.
/// For each `i` in the window, `floor(i - window.start)` is the minimum
/// allowed interval in seconds. Too few records is a distinct failure, never
/// an index panic: a client that stops retrying early must fail the test,
/// not silently pass it.
pub fn verify_backoff_floor(
    records: &[RequestRecord],
    window: Range<usize>,
    floor: impl Fn(usize) -> f64,
) -> Result<(), OracleError> {
    let needed = window.end + 1;
    if records.len() < needed {
        return Err(OracleError::InsufficientAttempts {
            needed,
            got: records.len(),
        });
    }

    for i in window.clone() {
        let measured = seconds_between(&records[i], &records[i + 1]);
        let bound = floor(i - window.start);
        if measured < bound {
            return Err(OracleError::BelowFloor {
                index: i,
                measured,
                floor: bound,
            });
        }
    }
    Ok(())
}

fn seconds_between(a: &RequestRecord, b: &RequestRecord) -> f64 {
    let delta = b.timestamp - a.timestamp;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1e6,
        // only on deltas of hundreds of thousands of years
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}
