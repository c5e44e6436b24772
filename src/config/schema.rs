//! Configuration schema definitions.
//!
//! This module defines the on-disk configuration structure. All types derive
//! Serde traits for deserialization from TOML; durations are plain integer
//! millisecond fields and are converted to [`BreakerConfig`] before use.

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::config::breaker::BreakerConfig;

/// Root configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FileConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Template for breakers created on first use without an explicit entry.
    pub defaults: BreakerSettings,

    /// Explicitly configured breakers.
    pub breakers: Vec<BreakerSettings>,
}

impl FileConfig {
    /// Find the settings for a named breaker.
    pub fn breaker(&self, name: &str) -> Option<&BreakerSettings> {
        self.breakers.iter().find(|b| b.name == name)
    }
}

/// Settings for one named breaker as written in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerSettings {
    /// Breaker identifier for logging/metrics.
    pub name: String,

    /// Failure fraction in (0, 1] that trips the breaker.
    pub failure_rate_threshold: f64,

    /// Rolling window length in milliseconds.
    pub window_ms: u64,

    /// Samples required in the window before the rate is trusted.
    pub minimum_throughput: u32,

    /// Time the breaker stays open before probing, in milliseconds.
    pub open_ms: u64,

    /// Concurrent probes admitted while half-open.
    pub half_open_max_in_flight: u32,

    /// Completed probes required before the breaker may close.
    pub half_open_min_probes: u32,

    /// Probe success fraction required to close.
    pub success_quorum_to_close: f64,

    /// Per-attempt deadline in milliseconds.
    pub call_timeout_ms: u64,

    /// Retries after the first attempt.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_backoff_base_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub retry_backoff_max_ms: u64,

    /// Random jitter added to each backoff, as a fraction of the delay.
    pub retry_jitter: f64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self::from(&BreakerConfig::default())
    }
}

impl BreakerSettings {
    /// Convert to the runtime configuration.
    pub fn to_config(&self) -> BreakerConfig {
        BreakerConfig {
            name: self.name.clone(),
            failure_rate_threshold: self.failure_rate_threshold,
            window_duration: Duration::from_millis(self.window_ms),
            minimum_throughput: self.minimum_throughput,
            open_duration: Duration::from_millis(self.open_ms),
            half_open_max_in_flight: self.half_open_max_in_flight,
            half_open_min_probes: self.half_open_min_probes,
            success_quorum_to_close: self.success_quorum_to_close,
            call_timeout: Duration::from_millis(self.call_timeout_ms),
            max_retries: self.max_retries,
            retry_backoff_base: Duration::from_millis(self.retry_backoff_base_ms),
            retry_backoff_max: Duration::from_millis(self.retry_backoff_max_ms),
            retry_jitter: self.retry_jitter,
        }
    }
}

impl From<&BreakerConfig> for BreakerSettings {
    fn from(config: &BreakerConfig) -> Self {
        Self {
            name: config.name.clone(),
            failure_rate_threshold: config.failure_rate_threshold,
            window_ms: config.window_duration.as_millis() as u64,
            minimum_throughput: config.minimum_throughput,
            open_ms: config.open_duration.as_millis() as u64,
            half_open_max_in_flight: config.half_open_max_in_flight,
            half_open_min_probes: config.half_open_min_probes,
            success_quorum_to_close: config.success_quorum_to_close,
            call_timeout_ms: config.call_timeout.as_millis() as u64,
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base.as_millis() as u64,
            retry_backoff_max_ms: config.retry_backoff_max.as_millis() as u64,
            retry_jitter: config.retry_jitter,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info", "breakwater=debug").
    pub log_level: String,

    /// Pretty output for development, JSON for production.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
