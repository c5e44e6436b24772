//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use breakwater::{BreakerConfig, Phase, TransitionListener, TransitionReason};

/// Error returned by the fake dependency.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyError(pub &'static str);

impl std::fmt::Display for DependencyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dependency error: {}", self.0)
    }
}

impl std::error::Error for DependencyError {}

/// Breaker settings used by most lifecycle tests: trips at 50% over 4 samples,
/// stays open for 30s, one probe at a time.
#[allow(dead_code)]
pub fn scenario_config(name: &str) -> BreakerConfig {
    BreakerConfig::new(name)
        .with_failure_rate_threshold(0.5)
        .with_window_duration(Duration::from_secs(60))
        .with_minimum_throughput(4)
        .with_open_duration(Duration::from_secs(30))
        .with_half_open_max_in_flight(1)
        .with_success_quorum_to_close(1.0)
        .with_call_timeout(Duration::from_secs(5))
}

/// A fake downstream dependency that can be switched between healthy and
/// failing, and counts how often it was called.
#[derive(Debug, Default)]
pub struct Dependency {
    failing: AtomicBool,
    calls: AtomicU32,
}

#[allow(dead_code)]
impl Dependency {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn call(&self) -> Result<&'static str, DependencyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(DependencyError("unavailable"))
        } else {
            Ok("ok")
        }
    }
}

/// Listener that records every transition.
#[derive(Debug, Default, Clone)]
pub struct TransitionLog {
    seen: Arc<Mutex<Vec<(Phase, Phase)>>>,
}

#[allow(dead_code)]
impl TransitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transitions(&self) -> Vec<(Phase, Phase)> {
        self.seen.lock().unwrap().clone()
    }
}

impl TransitionListener for TransitionLog {
    fn on_transition(&self, _name: &str, from: Phase, to: Phase, _reason: &TransitionReason) {
        self.seen.lock().unwrap().push((from, to));
    }
}
