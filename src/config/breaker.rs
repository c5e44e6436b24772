//! Runtime configuration for a single named breaker.

use std::time::Duration;

use crate::config::validation::{validate_breaker, ValidationError};

/// Thresholds and timing for one named breaker.
///
/// Immutable once handed to a [`Breaker`](crate::Breaker); build it with the
/// `with_*` methods and let the breaker validate it on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerConfig {
    /// Breaker identifier for logging/metrics.
    pub name: String,
    /// Failure fraction in (0, 1] that trips the breaker.
    pub failure_rate_threshold: f64,
    /// Length of the rolling outcome window.
    pub window_duration: Duration,
    /// Samples required in the window before the rate is trusted.
    pub minimum_throughput: u32,
    /// Time spent open before the next call is admitted as a probe.
    pub open_duration: Duration,
    /// Concurrent probes admitted while half-open.
    pub half_open_max_in_flight: u32,
    /// Completed probes required before a close decision.
    pub half_open_min_probes: u32,
    /// Probe success fraction required to close.
    pub success_quorum_to_close: f64,
    /// Deadline for each attempt.
    pub call_timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff delay; doubled on every further retry.
    pub retry_backoff_base: Duration,
    /// Upper bound for a single backoff delay.
    pub retry_backoff_max: Duration,
    /// Random jitter added to each backoff, as a fraction of the delay.
    pub retry_jitter: f64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            failure_rate_threshold: 0.5,
            window_duration: Duration::from_secs(60),
            minimum_throughput: 10,
            open_duration: Duration::from_secs(30),
            half_open_max_in_flight: 1,
            half_open_min_probes: 1,
            success_quorum_to_close: 1.0,
            call_timeout: Duration::from_secs(5),
            max_retries: 0,
            retry_backoff_base: Duration::from_millis(100),
            retry_backoff_max: Duration::from_secs(10),
            retry_jitter: 0.0,
        }
    }
}

// Configuration builder methods
impl BreakerConfig {
    /// Default configuration under the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_failure_rate_threshold(mut self, threshold: f64) -> Self {
        self.failure_rate_threshold = threshold;
        self
    }

    pub fn with_window_duration(mut self, window: Duration) -> Self {
        self.window_duration = window;
        self
    }

    pub fn with_minimum_throughput(mut self, samples: u32) -> Self {
        self.minimum_throughput = samples;
        self
    }

    pub fn with_open_duration(mut self, open: Duration) -> Self {
        self.open_duration = open;
        self
    }

    pub fn with_half_open_max_in_flight(mut self, probes: u32) -> Self {
        self.half_open_max_in_flight = probes;
        self
    }

    pub fn with_half_open_min_probes(mut self, probes: u32) -> Self {
        self.half_open_min_probes = probes;
        self
    }

    pub fn with_success_quorum_to_close(mut self, quorum: f64) -> Self {
        self.success_quorum_to_close = quorum;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.retry_backoff_base = base;
        self.retry_backoff_max = max;
        self
    }

    pub fn with_retry_jitter(mut self, jitter: f64) -> Self {
        self.retry_jitter = jitter;
        self
    }

    /// Check every rule, collecting all violations.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        validate_breaker(self)
    }
}
