//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Calculate the delay before retry number `retry` (1-based).
///
/// `base * 2^(retry - 1)`, capped at `max`, plus up to `jitter` (a fraction of
/// the capped delay) of random extra wait.
pub fn calculate_backoff(retry: u32, base: Duration, max: Duration, jitter: f64) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }

    let exponential_base = 2u32.saturating_pow(retry - 1);
    let delay = base.saturating_mul(exponential_base);
    let capped_delay = delay.min(max);

    // Non-finite jitter means none
    let fraction = if jitter.is_finite() { jitter.clamp(0.0, 1.0) } else { 0.0 };
    let jitter_range = capped_delay.mul_f64(fraction);
    let jitter = if jitter_range > Duration::ZERO {
        rand::thread_rng().gen_range(Duration::ZERO..jitter_range)
    } else {
        Duration::ZERO
    };

    capped_delay + jitter
}
