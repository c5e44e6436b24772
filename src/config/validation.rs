//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rates in (0, 1], counts >= 1, timeouts > 0)
//! - Detect duplicate breaker names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: config → Result<(), Vec<ValidationError>>
//! - Runs before a breaker is constructed; invalid thresholds never reach a call

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::breaker::BreakerConfig;
use crate::config::schema::FileConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("breaker name must not be empty")]
    EmptyName,

    #[error("breaker '{0}' is defined more than once")]
    DuplicateName(String),

    #[error("breaker '{name}': {field} = {value} is outside {range}")]
    OutOfRange {
        name: String,
        field: &'static str,
        value: f64,
        range: &'static str,
    },

    #[error("breaker '{name}': {field} must be at least 1")]
    ZeroCount { name: String, field: &'static str },

    #[error("breaker '{name}': {field} must be greater than zero")]
    ZeroDuration { name: String, field: &'static str },

    #[error("breaker '{name}': retry_backoff_max {max_ms}ms is below retry_backoff_base {base_ms}ms")]
    BackoffCapBelowBase { name: String, base_ms: u128, max_ms: u128 },

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Validate one breaker configuration.
pub fn validate_breaker(config: &BreakerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let name = &config.name;

    if name.trim().is_empty() {
        errors.push(ValidationError::EmptyName);
    }

    // NaN fails both comparisons, so it is rejected too
    if !(config.failure_rate_threshold > 0.0 && config.failure_rate_threshold <= 1.0) {
        errors.push(ValidationError::OutOfRange {
            name: name.clone(),
            field: "failure_rate_threshold",
            value: config.failure_rate_threshold,
            range: "(0, 1]",
        });
    }
    if !(config.success_quorum_to_close > 0.0 && config.success_quorum_to_close <= 1.0) {
        errors.push(ValidationError::OutOfRange {
            name: name.clone(),
            field: "success_quorum_to_close",
            value: config.success_quorum_to_close,
            range: "(0, 1]",
        });
    }
    if !(0.0..=1.0).contains(&config.retry_jitter) {
        errors.push(ValidationError::OutOfRange {
            name: name.clone(),
            field: "retry_jitter",
            value: config.retry_jitter,
            range: "[0, 1]",
        });
    }

    let counts = [
        ("minimum_throughput", config.minimum_throughput),
        ("half_open_max_in_flight", config.half_open_max_in_flight),
        ("half_open_min_probes", config.half_open_min_probes),
    ];
    for (field, value) in counts {
        if value < 1 {
            errors.push(ValidationError::ZeroCount { name: name.clone(), field });
        }
    }

    let durations = [
        ("window_duration", config.window_duration),
        ("call_timeout", config.call_timeout),
    ];
    for (field, value) in durations {
        if value.is_zero() {
            errors.push(ValidationError::ZeroDuration { name: name.clone(), field });
        }
    }

    if config.retry_backoff_max < config.retry_backoff_base {
        errors.push(ValidationError::BackoffCapBelowBase {
            name: name.clone(),
            base_ms: config.retry_backoff_base.as_millis(),
            max_ms: config.retry_backoff_max.as_millis(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a whole configuration file.
pub fn validate_config(config: &FileConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut defaults = config.defaults.to_config();
    if defaults.name.trim().is_empty() {
        defaults.name = "defaults".to_string();
    }
    if let Err(mut e) = validate_breaker(&defaults) {
        errors.append(&mut e);
    }

    let mut seen = HashSet::new();
    for settings in &config.breakers {
        if !seen.insert(settings.name.as_str()) {
            errors.push(ValidationError::DuplicateName(settings.name.clone()));
        }
        if let Err(mut e) = validate_breaker(&settings.to_config()) {
            errors.append(&mut e);
        }
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
