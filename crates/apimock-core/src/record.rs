use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One accepted HTTP request, as observed by the mock server
///
/// Serialized to JSON on the `/stats` route; the `timestamp` field becomes an
/// ISO-8601 string with sub-second precision.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct RequestRecord {
    /// Instant the server accepted the request
    pub timestamp: DateTime<Utc>,
    /// Origin address of the caller (`ip:port`)
    pub client_address: String,
    /// HTTP method
    pub command: String,
    /// Requested resource path
    pub path: String,
    /// HTTP version reported by the client, e.g. `HTTP/1.1`
    pub request_version: String,
}

/// Ordered, append-only log of accepted requests
///
/// Insertion order is the retry sequence. Records are appended exactly once
/// per accepted request and never reordered or mutated afterwards. The log
/// lives for the server process's lifetime; there is no persistence.
#[derive(Default)]
pub struct RequestLog {
    records: Mutex<Vec<RequestRecord>>,
}

impl RequestLog {
    /// Create an empty log
    pub fn new() -> Self {
        RequestLog::default()
    }

    /// Append a record and return its zero-based index
    ///
    /// The index doubles as the attempt number fed into the response policy.
    /// Both are assigned under one lock acquisition, so concurrent appends
    /// can neither lose records nor hand out duplicate attempt numbers.
    pub fn append(&self, record: RequestRecord) -> usize {
        let mut records = self.records.lock();
        records.push(record);
        records.len() - 1
    }

    /// Stamp the arrival time and append under one lock acquisition
    ///
    /// Overwrites `record.timestamp` with the current instant inside the
    /// critical section. Whoever takes the lock first gets both the earlier
    /// index and the earlier timestamp, so log order can never contradict
    /// timestamp order when requests race.
    pub fn append_now(&self, mut record: RequestRecord) -> usize {
        let mut records = self.records.lock();
        record.timestamp = Utc::now();
        records.push(record);
        records.len() - 1
    }

    /// Clone the current contents as a consistent snapshot
    pub fn snapshot(&self) -> Vec<RequestRecord> {
        self.records.lock().clone()
    }
}
