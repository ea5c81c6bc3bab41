//! 🏗 HTTP routing and response construction

use std::io;

use chrono::Utc;
use tiny_http::{Header, Response};
use tracing::warn;

use apimock_core::{RequestLog, RequestRecord, ResponsePolicy};

/// Read-only route serving the request log
const STATS_PATH: &str = "/stats";

const ACK_BODY: &str = "Hello from the API server mock";
const UNAVAILABLE_BODY: &str = "Service temporarily unavailable";

/// Dispatch one request
///
/// `GET /stats` is answered from the log without side effects; every other
/// request is appended to the log and answered per the policy. Failures while
/// responding are logged and swallowed so one bad request cannot take down
/// the remaining test session.
pub(crate) fn handle(rq: tiny_http::Request, log: &RequestLog, policy: &ResponsePolicy) {
    use tiny_http::Method::Get;

    let result = match (rq.method(), rq.url()) {
        (Get, STATS_PATH) => respond_stats(rq, log),
        _ => record_and_respond(rq, log, policy),
    };

    if let Err(err) = result {
        warn!("failed to answer request: {err}");
    }
}

fn respond_stats(rq: tiny_http::Request, log: &RequestLog) -> io::Result<()> {
    match serde_json::to_string(&log.snapshot()) {
        Ok(body) => {
            let res = Response::from_string(body).with_header(content_type(b"application/json"));
            rq.respond(res)
        }
        Err(err) => {
            warn!("request log serialization failed: {err}");
            rq.respond(Response::from_string("log serialization failed").with_status_code(500))
        }
    }
}

fn record_and_respond(
    rq: tiny_http::Request,
    log: &RequestLog,
    policy: &ResponsePolicy,
) -> io::Result<()> {
    let record = RequestRecord {
        // placeholder, re-stamped under the log lock
        timestamp: Utc::now(),
        client_address: rq
            .remote_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| String::from("unknown")),
        command: rq.method().to_string(),
        path: rq.url().to_string(),
        request_version: format!("HTTP/{}", rq.http_version()),
    };

    // Timestamp and attempt index are both assigned under the log lock, so
    // racing requests can neither observe the same position in the schedule
    // nor leave the log ordered against its own timestamps.
    let attempt = log.append_now(record);
    let status = policy.status_for(attempt as u64);

    // Deliberately no Retry-After header, whatever the status: the client
    // under test must fall back to its own backoff schedule.
    let body = if (200..300).contains(&status) {
        ACK_BODY
    } else {
        UNAVAILABLE_BODY
    };
    let res = Response::from_string(body)
        .with_status_code(status)
        .with_header(content_type(b"text/plain"));
    rq.respond(res)
}

fn content_type(value: &[u8]) -> Header {
    Header::from_bytes(b"Content-Type", value).unwrap()
}
