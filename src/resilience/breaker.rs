//! Circuit breaker engine.
//!
//! # Responsibilities
//! - Admit or reject each call according to the current phase
//! - Run admitted calls with timeout and retry
//! - Feed the final outcome back into the state machine
//! - Notify listeners of phase changes
//!
//! # Design Decisions
//! - One mutex per breaker; it guards the admission check and the outcome
//!   record, never the operation, its timeout or a backoff sleep
//! - Probe slots are held by an RAII permit, released on every exit path
//!   including cancellation of the `execute` future
//! - Listeners run after the lock is dropped

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use serde::Serialize;
use tokio::time::Instant;

use crate::clock::{Clock, TokioClock};
use crate::config::{BreakerConfig, ConfigError};
use crate::observability::metrics;
use crate::resilience::error::{AttemptError, BreakerError, CircuitCallFault, CircuitOpenFault};
use crate::resilience::listener::{log_transition, TransitionListener};
use crate::resilience::retries::{run_with_retry, RetryPolicy, RetryReport};
use crate::resilience::state::{Admission, BreakerState, Phase, Transition};
use crate::resilience::window::Outcome;

/// Read-only copy of a breaker's state for metrics export.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub phase: Phase,
    pub failure_rate: f64,
    pub sample_count: usize,
    pub half_open_in_flight: u32,
    #[serde(skip)]
    pub phase_entered_at: Instant,
    pub time_in_phase_ms: u64,
    pub total_calls: u64,
    pub rejected_calls: u64,
    pub times_opened: u64,
    /// Late outcomes dropped because the phase that admitted them had ended.
    pub stale_outcomes: u64,
}

/// A named circuit breaker.
///
/// Share it between tasks with `Arc<Breaker>`.
#[derive(Debug)]
pub struct Breaker {
    config: BreakerConfig,
    policy: RetryPolicy,
    state: Mutex<BreakerState>,
    clock: Arc<dyn Clock>,
    listener: Option<Arc<dyn TransitionListener>>,
}

impl Breaker {
    /// Create a breaker, rejecting invalid configuration.
    pub fn new(config: BreakerConfig) -> Result<Self, ConfigError> {
        config.validate().map_err(ConfigError::Validation)?;
        Ok(Self::from_validated(config))
    }

    pub(crate) fn from_validated(config: BreakerConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock);
        let state = BreakerState::new(config.window_duration, clock.now());
        metrics::record_phase(&config.name, Phase::Closed);

        Self {
            policy: RetryPolicy::from(&config),
            config,
            state: Mutex::new(state),
            clock,
            listener: None,
        }
    }

    /// Use a different time source. Resets the breaker to a fresh closed state.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.state = Mutex::new(BreakerState::new(self.config.window_duration, clock.now()));
        self.clock = clock;
        self
    }

    /// Register the transition listener.
    pub fn with_listener(mut self, listener: Arc<dyn TransitionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    /// Current phase, without triggering the lazy open → half-open check.
    pub fn phase(&self) -> Phase {
        self.lock_state().phase()
    }

    /// Run `operation` through the breaker.
    ///
    /// Returns [`BreakerError::Open`] without calling `operation` when the
    /// breaker rejects the call, and [`BreakerError::Call`] when the final
    /// attempt failed. `operation` is called once per attempt and must be safe
    /// to retry when `max_retries > 0`.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let name = &self.config.name;

        let (admission, transition) = {
            let mut state = self.lock_state();
            let now = self.clock.now();
            state.admit(&self.config, now)
        };
        if let Some(transition) = transition {
            self.notify(transition);
        }

        let ticket = match admission {
            Admission::Rejected { phase, retry_after } => {
                tracing::debug!(breaker = %name, %phase, retry_after = ?retry_after, "Call rejected");
                metrics::record_rejection(name, phase);
                return Err(CircuitOpenFault {
                    name: name.clone(),
                    phase,
                    retry_after,
                }
                .into());
            }
            Admission::Admitted { episode, probe } => Ticket {
                episode,
                permit: probe.then(|| ProbePermit {
                    breaker: self,
                    episode,
                    armed: true,
                }),
            },
        };

        let RetryReport { result, attempts, elapsed } =
            run_with_retry(name, &self.policy, self.clock.as_ref(), &mut operation).await;

        let failure = result.as_ref().err().map(AttemptError::kind);
        metrics::record_call(name, failure.unwrap_or("success"), elapsed);
        if let Some(kind) = failure {
            tracing::debug!(breaker = %name, attempts, kind, elapsed = ?elapsed, "Call failed");
        }

        let transition = match ticket.permit {
            Some(probe) => probe.complete(failure),
            None => self.record_outcome(failure, ticket.episode),
        };
        if let Some(transition) = transition {
            self.notify(transition);
        }

        result.map_err(|source| {
            CircuitCallFault {
                name: name.clone(),
                source,
                attempts,
                elapsed,
            }
            .into()
        })
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let mut state = self.lock_state();
        let now = self.clock.now();
        let (failure_rate, sample_count) = state.failure_rate(now);

        BreakerSnapshot {
            name: self.config.name.clone(),
            phase: state.phase(),
            failure_rate,
            sample_count,
            half_open_in_flight: state.half_open_in_flight(),
            phase_entered_at: state.phase_entered_at(),
            time_in_phase_ms: saturating_millis(now.saturating_duration_since(state.phase_entered_at())),
            total_calls: state.total_calls(),
            rejected_calls: state.rejected_calls(),
            times_opened: state.times_opened(),
            stale_outcomes: state.stale_outcomes(),
        }
    }

    /// Time left before an open breaker admits a probe; `None` unless open.
    pub fn retry_after(&self) -> Option<Duration> {
        let state = self.lock_state();
        if state.phase() != Phase::Open {
            return None;
        }
        let elapsed = self.clock.now().saturating_duration_since(state.phase_entered_at());
        Some(self.config.open_duration.saturating_sub(elapsed))
    }

    /// Force the breaker closed and clear its history.
    pub fn reset(&self) {
        let transition = {
            let mut state = self.lock_state();
            let now = self.clock.now();
            state.reset(now)
        };
        if let Some(transition) = transition {
            self.notify(transition);
        }
    }

    /// `failure` is the failure kind, `None` for success.
    fn record_outcome(&self, failure: Option<&'static str>, episode: u64) -> Option<Transition> {
        let mut state = self.lock_state();
        // Timestamp taken under the lock keeps the window ordered
        let now = self.clock.now();
        let outcome = match failure {
            Some(kind) => Outcome::failure(now, kind),
            None => Outcome::success(now),
        };
        state.record(&self.config, outcome, episode)
    }

    fn notify(&self, transition: Transition) {
        let Transition { from, to, reason } = transition;
        log_transition(&self.config.name, from, to, &reason);
        metrics::record_transition(&self.config.name, from, to);
        if let Some(listener) = &self.listener {
            listener.on_transition(&self.config.name, from, to, &reason);
        }
    }

    // State updates never leave the struct half-written, so a poisoned lock
    // is still safe to use.
    fn lock_state(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// What an admitted call needs to report its outcome.
struct Ticket<'a> {
    episode: u64,
    permit: Option<ProbePermit<'a>>,
}

/// A half-open probe slot.
struct ProbePermit<'a> {
    breaker: &'a Breaker,
    episode: u64,
    armed: bool,
}

impl ProbePermit<'_> {
    /// Record the probe outcome; this also releases the slot.
    fn complete(mut self, failure: Option<&'static str>) -> Option<Transition> {
        self.armed = false;
        self.breaker.record_outcome(failure, self.episode)
    }
}

impl Drop for ProbePermit<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(breaker = %self.breaker.config.name, "Probe abandoned, releasing slot");
            self.breaker.lock_state().release_probe(self.episode);
        }
    }
}
