use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;

const MAX_BACKOFF_EXPONENT: u32 = 6;
const MAX_DELAY: Duration = Duration::from_secs(30);

/// How many times a request may be sent and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    /// A single attempt.
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(base_delay_ms.max(1)),
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Whether another send may follow the 1-based `attempt` that just failed.
    pub fn allows_retry_after(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }

    /// Exponential backoff from the base delay, raised to the server's
    /// `Retry-After` when that is longer and capped at 30 seconds.
    pub fn delay_before_retry(&self, attempt: usize, retry_after: Option<Duration>) -> Duration {
        let exponent = u32::try_from(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX)
            .min(MAX_BACKOFF_EXPONENT);
        let backoff = self.base_delay.saturating_mul(2_u32.pow(exponent));
        backoff.max(retry_after.unwrap_or_default()).min(MAX_DELAY)
    }

    pub fn is_retryable_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    pub fn is_retryable_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
    }
}

/// `Retry-After` in whole seconds; HTTP-date values are ignored.
pub fn retry_after_from_headers(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
