//! Loading breaker configuration from disk.

use std::path::PathBuf;
use std::time::Duration;

use breakwater::config::{load_config, LogFormat};
use breakwater::{BreakerRegistry, ConfigError};

fn write_temp_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("breakwater-{}-{}.toml", name, std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_config_builds_registry() {
    let path = write_temp_config(
        "valid",
        r#"
        [observability]
        log_level = "debug"
        log_format = "json"

        [defaults]
        minimum_throughput = 20
        open_ms = 10000

        [[breakers]]
        name = "payments"
        failure_rate_threshold = 0.25
        window_ms = 30000
        minimum_throughput = 5
        half_open_max_in_flight = 2
        half_open_min_probes = 2
        call_timeout_ms = 250
        max_retries = 2
        "#,
    );

    let config = load_config(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.observability.log_level, "debug");
    assert_eq!(config.observability.log_format, LogFormat::Json);
    assert!(config.breaker("payments").is_some());

    let registry = BreakerRegistry::from_config(&config).unwrap();
    let payments = registry.get_or_create("payments");
    let settings = payments.config();
    assert_eq!(settings.failure_rate_threshold, 0.25);
    assert_eq!(settings.window_duration, Duration::from_secs(30));
    assert_eq!(settings.minimum_throughput, 5);
    assert_eq!(settings.half_open_max_in_flight, 2);
    assert_eq!(settings.call_timeout, Duration::from_millis(250));
    assert_eq!(settings.max_retries, 2);

    let search = registry.get_or_create("search");
    assert_eq!(search.name(), "search");
    assert_eq!(search.config().minimum_throughput, 20);
    assert_eq!(search.config().open_duration, Duration::from_secs(10));
}

#[test]
fn test_invalid_file_reports_every_problem() {
    let path = write_temp_config(
        "invalid",
        r#"
        [[breakers]]
        name = "a"
        success_quorum_to_close = 0.0

        [[breakers]]
        name = "a"
        window_ms = 0
        "#,
    );

    let err = load_config(&path).unwrap_err();
    std::fs::remove_file(&path).ok();

    match err {
        ConfigError::Validation(errors) => assert_eq!(errors.len(), 3),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_file_uses_defaults() {
    let path = write_temp_config("empty", "");
    let config = load_config(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!(config.breakers.is_empty());
    assert!(!config.observability.metrics_enabled);
    assert!(BreakerRegistry::from_config(&config).unwrap().is_empty());
}
