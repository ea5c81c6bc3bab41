use std::sync::Arc;

/// Response policy for logged requests
///
/// Decides the status code of the `attempt`-th logged request (zero-based).
/// Whatever the policy says, the server never sends a `Retry-After` header:
/// the scenario under test is a server that signals unavailability without
/// giving the client any guidance on when to retry.
#[derive(Clone)]
pub enum ResponsePolicy {
    /// Answer every request with 200
    AlwaysOk,
    /// Answer the first `n` requests with `status`, all later ones with 200
    FailNThenOk {
        /// Number of leading requests to reject
        n: u64,
        /// Status code for the rejected requests
        status: u16,
    },
    /// Arbitrary schedule: attempt index to status code
    Custom(Arc<dyn Fn(u64) -> u16 + Send + Sync>),
}

impl ResponsePolicy {
    /// Reject the first `n` requests with 503, then answer 200
    pub fn fail_n_then_ok(n: u64) -> Self {
        ResponsePolicy::FailNThenOk { n, status: 503 }
    }

    /// Status code for the given zero-based attempt index
    pub fn status_for(&self, attempt: u64) -> u16 {
        match self {
            ResponsePolicy::AlwaysOk => 200,
            ResponsePolicy::FailNThenOk { n, status } => {
                if attempt < *n {
                    *status
                } else {
                    200
                }
            }
            ResponsePolicy::Custom(schedule) => schedule(attempt),
        }
    }
}

impl Default for ResponsePolicy {
    fn default() -> Self {
        ResponsePolicy::AlwaysOk
    }
}

impl std::fmt::Debug for ResponsePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponsePolicy::AlwaysOk => f.debug_struct("AlwaysOk").finish(),
            ResponsePolicy::FailNThenOk { n, status } => f
                .debug_struct("FailNThenOk")
                .field("n", n)
                .field("status", status)
                .finish(),
            ResponsePolicy::Custom(_) => f
                .debug_struct("Custom")
                .field("schedule", &format_args!(".."))
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_ok_never_fails() {
        let policy = ResponsePolicy::AlwaysOk;
        for attempt in 0..10 {
            assert_eq!(policy.status_for(attempt), 200);
        }
    }

    #[test]
    fn fail_n_then_ok_switches_at_n() {
        let policy = ResponsePolicy::fail_n_then_ok(7);
        let schedule: Vec<u16> = (0..9).map(|i| policy.status_for(i)).collect();
        assert_eq!(schedule, [503, 503, 503, 503, 503, 503, 503, 200, 200]);
    }

    #[test]
    fn custom_schedule_is_consulted_per_attempt() {
        let policy =
            ResponsePolicy::Custom(Arc::new(|attempt| if attempt % 2 == 0 { 503 } else { 200 }));
        assert_eq!(policy.status_for(0), 503);
        assert_eq!(policy.status_for(1), 200);
        assert_eq!(policy.status_for(2), 503);
    }
}
