//! Bounded retries with exponential backoff and jitter.
//!
//! [`retry_with_backoff`] wraps any fallible async unit of work. It never
//! inspects or reclassifies the error: it only waits and repeats, and once the
//! attempt budget is spent the last error is handed back unchanged.
//!
//! # Backoff Strategy
//!
//! The wait after failed attempt `n` (0-based) is:
//! ```text
//! delay = min(base_delay * 2^n, max_delay) + uniform(0..=jitter)
//! ```
//! There is no wait after the final attempt.

use rand::{Rng, rng};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, warn};

/// How often and how patiently to retry.
#[derive(Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_retries: usize,
    /// Initial delay between attempts (doubles with each attempt).
    pub base_delay: Duration,
    /// Upper bound for the random jitter added to every delay.
    pub jitter: Duration,
    /// Cap on the exponential part of the delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, base_delay: Duration, jitter: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            jitter,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Delay to wait after the failed attempt with 0-based index `attempt`.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.min(16);
        let delay = self.base_delay.saturating_mul(factor).min(self.max_delay);
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return delay;
        }
        delay + Duration::from_millis(rng().random_range(0..=jitter_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(1), Duration::from_secs(1))
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("jitter", &self.jitter)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

/// Run `op` until it succeeds or the policy's attempt budget is spent.
///
/// # Arguments
///
/// * `policy` - Attempt budget and backoff parameters. A budget of 0 still
///   makes one attempt.
/// * `label` - Name of the unit of work, used in log fields
/// * `op` - Factory producing a fresh future for every attempt
///
/// # Returns
///
/// The first success, or the error of the last attempt.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let attempts = policy.max_retries.max(1);
    let total_t0 = Instant::now();
    let mut attempt = 0usize;

    loop {
        let attempt_t0 = Instant::now();
        match op().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(
                        %label,
                        attempt = attempt + 1,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        "Succeeded after retrying"
                    );
                }
                return Ok(value);
            }
            Err(e) => {
                attempt += 1;
                let elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64;
                let elapsed_ms_total = total_t0.elapsed().as_millis() as u64;

                if attempt >= attempts {
                    error!(
                        %label,
                        attempt,
                        max = attempts,
                        elapsed_ms_attempt,
                        elapsed_ms_total,
                        error = %e,
                        "Exhausted retries"
                    );
                    return Err(e);
                }

                let delay = policy.delay_for(attempt - 1);
                warn!(
                    %label,
                    attempt,
                    max = attempts,
                    elapsed_ms_attempt,
                    ?delay,
                    error = %e,
                    "Attempt failed; backing off"
                );
                sleep(delay).await;
            }
        }
    }
}
