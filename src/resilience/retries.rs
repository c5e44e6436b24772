//! Retry logic.
//!
//! # Responsibilities
//! - Run an operation up to `max_retries + 1` times
//! - Enforce `call_timeout` on each attempt
//! - Sleep with exponential backoff + jitter between attempts
//!
//! # Design Decisions
//! - Each attempt yields a tagged `Result`; the loop inspects the tag
//! - Nothing here touches breaker state: the caller records only the final
//!   attempt, so retries never inflate the failure rate
//! - The operation must be safe to retry; that is the caller's contract

use std::future::Future;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::BreakerConfig;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::error::AttemptError;
use crate::resilience::timeouts::with_timeout;

/// Retry and timeout parameters for one breaker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub call_timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub jitter: f64,
}

impl From<&BreakerConfig> for RetryPolicy {
    fn from(config: &BreakerConfig) -> Self {
        Self {
            call_timeout: config.call_timeout,
            max_retries: config.max_retries,
            backoff_base: config.retry_backoff_base,
            backoff_max: config.retry_backoff_max,
            jitter: config.retry_jitter,
        }
    }
}

/// What happened across all attempts.
#[derive(Debug)]
pub struct RetryReport<T, E> {
    /// Result of the final attempt.
    pub result: Result<T, AttemptError<E>>,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Run `operation` under `policy`.
///
/// `name` is only used for log fields. `elapsed` is measured on `clock`, the
/// same clock that timestamps the breaker's outcomes.
pub async fn run_with_retry<F, Fut, T, E>(
    name: &str,
    policy: &RetryPolicy,
    clock: &dyn Clock,
    operation: &mut F,
) -> RetryReport<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let started = clock.now();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let result = with_timeout(policy.call_timeout, operation()).await;

        match result {
            Err(e) if attempts <= policy.max_retries => {
                let backoff = calculate_backoff(attempts, policy.backoff_base, policy.backoff_max, policy.jitter);
                tracing::debug!(
                    breaker = %name,
                    attempt = attempts,
                    kind = e.kind(),
                    delay = ?backoff,
                    "Retrying call"
                );
                crate::observability::metrics::record_retry(name);
                tokio::time::sleep(backoff).await;
            }
            result => {
                return RetryReport {
                    result,
                    attempts,
                    elapsed: clock.now().saturating_duration_since(started),
                };
            }
        }
    }
}
