//! Breaker phase state machine.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - HalfOpen: a bounded number of probes test recovery
//!
//! # State Transitions
//! ```text
//! Closed   → Open:     samples >= minimum_throughput && failure_rate >= threshold
//! Open     → HalfOpen: first call after open_duration (evaluated lazily)
//! HalfOpen → Closed:   probes >= half_open_min_probes && success ratio >= quorum
//! HalfOpen → Open:     any probe fails
//! ```
//!
//! # Design Decisions
//! - Pure bookkeeping: every method takes `now` and returns the transition it
//!   made, so the engine can fire listeners after dropping the lock
//! - Every phase entry starts a new episode; each admitted call carries the
//!   episode that admitted it, and its outcome is discarded once that episode
//!   is over

use std::fmt;
use std::time::Duration;
use serde::Serialize;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::resilience::window::{Outcome, OutcomeWindow};

/// Breaker phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Closed,
    Open,
    HalfOpen,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Closed => "closed",
            Phase::Open => "open",
            Phase::HalfOpen => "half_open",
        }
    }

    /// Numeric encoding for gauges.
    pub fn as_gauge(&self) -> f64 {
        match self {
            Phase::Closed => 0.0,
            Phase::HalfOpen => 1.0,
            Phase::Open => 2.0,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a transition happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TransitionReason {
    /// The window failure rate reached the threshold.
    FailureRateExceeded { failure_rate: f64, samples: usize },
    /// `open_duration` elapsed and a call arrived.
    OpenTimeoutElapsed,
    /// A half-open probe failed.
    ProbeFailed,
    /// Enough probes succeeded.
    ProbesSucceeded { successes: usize, probes: usize },
    /// Forced closed by the host.
    ManualReset,
}

impl fmt::Display for TransitionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionReason::FailureRateExceeded { failure_rate, samples } => {
                write!(f, "failure rate {:.2} over {} samples", failure_rate, samples)
            }
            TransitionReason::OpenTimeoutElapsed => f.write_str("open duration elapsed"),
            TransitionReason::ProbeFailed => f.write_str("probe failed"),
            TransitionReason::ProbesSucceeded { successes, probes } => {
                write!(f, "{}/{} probes succeeded", successes, probes)
            }
            TransitionReason::ManualReset => f.write_str("manual reset"),
        }
    }
}

/// A phase change.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub reason: TransitionReason,
}

/// Admission decision for one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Admission {
    /// Run the call. `episode` identifies the phase that admitted it; `probe`
    /// is set for half-open probes.
    Admitted { episode: u64, probe: bool },
    /// Do not run the call.
    Rejected {
        phase: Phase,
        retry_after: Option<Duration>,
    },
}

/// Mutable state of one breaker. Always accessed under the breaker lock.
#[derive(Debug)]
pub struct BreakerState {
    phase: Phase,
    phase_entered_at: Instant,
    episode: u64,
    outcomes: OutcomeWindow,
    half_open_in_flight: u32,
    half_open_results: Vec<bool>,
    total_calls: u64,
    rejected_calls: u64,
    times_opened: u64,
    stale_outcomes: u64,
}

impl BreakerState {
    pub fn new(window: Duration, now: Instant) -> Self {
        Self {
            phase: Phase::Closed,
            phase_entered_at: now,
            episode: 0,
            outcomes: OutcomeWindow::new(window),
            half_open_in_flight: 0,
            half_open_results: Vec::new(),
            total_calls: 0,
            rejected_calls: 0,
            times_opened: 0,
            stale_outcomes: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn phase_entered_at(&self) -> Instant {
        self.phase_entered_at
    }

    pub fn half_open_in_flight(&self) -> u32 {
        self.half_open_in_flight
    }

    pub fn total_calls(&self) -> u64 {
        self.total_calls
    }

    pub fn rejected_calls(&self) -> u64 {
        self.rejected_calls
    }

    pub fn times_opened(&self) -> u64 {
        self.times_opened
    }

    /// Outcomes dropped because their episode had already ended.
    pub fn stale_outcomes(&self) -> u64 {
        self.stale_outcomes
    }

    pub fn failure_rate(&mut self, now: Instant) -> (f64, usize) {
        self.outcomes.failure_rate(now)
    }

    /// Decide whether a call may run.
    pub fn admit(&mut self, config: &BreakerConfig, now: Instant) -> (Admission, Option<Transition>) {
        self.total_calls += 1;
        let mut transition = None;

        if self.phase == Phase::Open {
            let elapsed = now.saturating_duration_since(self.phase_entered_at);
            if elapsed < config.open_duration {
                self.rejected_calls += 1;
                let rejected = Admission::Rejected {
                    phase: Phase::Open,
                    retry_after: Some(config.open_duration - elapsed),
                };
                return (rejected, None);
            }
            transition = Some(self.enter(Phase::HalfOpen, TransitionReason::OpenTimeoutElapsed, now));
        }

        let admission = match self.phase {
            Phase::Closed => Admission::Admitted { episode: self.episode, probe: false },
            Phase::HalfOpen if self.half_open_in_flight < config.half_open_max_in_flight => {
                self.half_open_in_flight += 1;
                Admission::Admitted { episode: self.episode, probe: true }
            }
            phase => {
                self.rejected_calls += 1;
                Admission::Rejected { phase, retry_after: None }
            }
        };
        (admission, transition)
    }

    /// Record the final outcome of an admitted call.
    ///
    /// `episode` is the one returned by [`admit`](Self::admit). Outcomes from an
    /// episode that has since ended are dropped, so a slow call started before
    /// an outage cannot affect the phase that followed it.
    pub fn record(&mut self, config: &BreakerConfig, outcome: Outcome, episode: u64) -> Option<Transition> {
        if episode != self.episode {
            self.stale_outcomes += 1;
            return None;
        }

        let now = outcome.timestamp;
        let succeeded = outcome.succeeded;
        self.outcomes.record(outcome);

        match self.phase {
            Phase::Closed => {
                let (failure_rate, samples) = self.outcomes.failure_rate(now);
                if samples >= config.minimum_throughput as usize
                    && failure_rate >= config.failure_rate_threshold
                {
                    let reason = TransitionReason::FailureRateExceeded { failure_rate, samples };
                    return Some(self.enter(Phase::Open, reason, now));
                }
                None
            }
            Phase::HalfOpen => {
                self.half_open_in_flight = self.half_open_in_flight.saturating_sub(1);
                self.half_open_results.push(succeeded);
                if !succeeded {
                    return Some(self.enter(Phase::Open, TransitionReason::ProbeFailed, now));
                }

                let probes = self.half_open_results.len();
                let successes = self.half_open_results.iter().filter(|ok| **ok).count();
                if probes >= config.half_open_min_probes as usize
                    && successes as f64 / probes as f64 >= config.success_quorum_to_close
                {
                    let reason = TransitionReason::ProbesSucceeded { successes, probes };
                    return Some(self.enter(Phase::Closed, reason, now));
                }
                None
            }
            // Nothing is admitted while open, so no call can finish in the same episode
            Phase::Open => None,
        }
    }

    /// Release a probe slot without recording an outcome (cancelled probe).
    pub fn release_probe(&mut self, episode: u64) {
        if self.phase == Phase::HalfOpen && episode == self.episode {
            self.half_open_in_flight = self.half_open_in_flight.saturating_sub(1);
        }
    }

    /// Force the breaker closed.
    pub fn reset(&mut self, now: Instant) -> Option<Transition> {
        if self.phase == Phase::Closed {
            return None;
        }
        Some(self.enter(Phase::Closed, TransitionReason::ManualReset, now))
    }

    #[cfg(test)]
    pub(crate) fn window_len(&mut self, now: Instant) -> usize {
        self.outcomes.len(now)
    }

    fn enter(&mut self, to: Phase, reason: TransitionReason, now: Instant) -> Transition {
        let from = self.phase;
        self.phase = to;
        self.phase_entered_at = now;
        self.episode += 1;
        self.half_open_in_flight = 0;
        self.half_open_results.clear();

        match to {
            Phase::Open => self.times_opened += 1,
            Phase::Closed => self.outcomes.clear(),
            Phase::HalfOpen => {}
        }

        Transition { from, to, reason }
    }
}
