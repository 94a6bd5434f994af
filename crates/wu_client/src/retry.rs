//! Bounded retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use common::{Error, Result};
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

/// Attempt budget and backoff schedule for one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: u32,
    pub per_attempt_timeout: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

    pub fn new(max_attempts: u32, per_attempt_timeout: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: Self::DEFAULT_BASE_DELAY,
            factor: 2,
            per_attempt_timeout,
        }
    }

    /// Wait after the given failed attempt (1-based): base × factor^(attempt−1).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let multiplier = self.factor.checked_pow(exp).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(multiplier)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Duration::from_secs(15))
    }
}

/// Run `op` until it succeeds or the attempt budget is spent.
///
/// `op` receives the 1-based attempt number. Each attempt is cut off at
/// `per_attempt_timeout`; timeouts and errors both count as failures. The
/// final error is returned inside [`Error::FetchExhausted`].
pub async fn fetch_with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let timeout_ms = policy.per_attempt_timeout.as_millis() as u64;
    let mut attempt = 1;

    loop {
        let outcome = match timeout(policy.per_attempt_timeout, op(attempt)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout { timeout_ms }),
        };

        let err = match outcome {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}/{}", label, attempt, max_attempts);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if attempt >= max_attempts {
            warn!("{} attempt {}/{} failed: {}", label, attempt, max_attempts, err);
            return Err(Error::FetchExhausted {
                attempts: attempt,
                last: Box::new(err),
            });
        }

        let delay = policy.delay_for(attempt);
        warn!(
            "{} attempt {}/{} failed: {}. Retrying in {:?}",
            label, attempt, max_attempts, err, delay
        );
        sleep(delay).await;
        attempt += 1;
    }
}
