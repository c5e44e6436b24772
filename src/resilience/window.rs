//! Rolling outcome window.
//!
//! # Responsibilities
//! - Record success/failure outcomes with their timestamps
//! - Derive the failure rate and sample count over the last `window_duration`
//!
//! # Design Decisions
//! - Entries are appended in timestamp order (recorded under the breaker lock
//!   with a monotonic clock), so stale entries are always at the front
//! - Pruned on every record and every read: memory is bounded by the call rate
//!   times the window length, never by process lifetime
//! - A running failure counter keeps `failure_rate` O(1) after pruning
//! - Zero samples report `(0.0, 0)`; callers gate on the sample count

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Result of one completed call, as seen by the breaker.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub timestamp: Instant,
    pub succeeded: bool,
    /// Failure classification ("timeout", "operation"); `None` on success.
    pub error_kind: Option<String>,
}

impl Outcome {
    pub fn success(timestamp: Instant) -> Self {
        Self {
            timestamp,
            succeeded: true,
            error_kind: None,
        }
    }

    pub fn failure(timestamp: Instant, kind: impl Into<String>) -> Self {
        Self {
            timestamp,
            succeeded: false,
            error_kind: Some(kind.into()),
        }
    }
}

/// Time-bounded record of recent outcomes.
#[derive(Debug)]
pub struct OutcomeWindow {
    window: Duration,
    entries: VecDeque<Outcome>,
    failures: usize,
}

impl OutcomeWindow {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: VecDeque::new(),
            failures: 0,
        }
    }

    /// Append an outcome, dropping entries that fell out of the window.
    pub fn record(&mut self, outcome: Outcome) {
        let now = outcome.timestamp;
        if !outcome.succeeded {
            self.failures += 1;
        }
        self.entries.push_back(outcome);
        self.prune(now);
    }

    /// Failure fraction and sample count over the window ending at `now`.
    pub fn failure_rate(&mut self, now: Instant) -> (f64, usize) {
        self.prune(now);
        let total = self.entries.len();
        if total == 0 {
            return (0.0, 0);
        }
        (self.failures as f64 / total as f64, total)
    }

    /// Number of entries still inside the window at `now`.
    pub fn len(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.entries.len()
    }

    pub fn is_empty(&mut self, now: Instant) -> bool {
        self.len(now) == 0
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.failures = 0;
    }

    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.entries.front() {
            if now.saturating_duration_since(front.timestamp) <= self.window {
                break;
            }
            if let Some(stale) = self.entries.pop_front() {
                if !stale.succeeded {
                    self.failures -= 1;
                }
            }
        }
    }
}
