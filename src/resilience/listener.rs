//! Transition notifications for the host service.

use std::fmt::Debug;

use crate::resilience::state::{Phase, TransitionReason};

/// Receives every phase change of a breaker.
///
/// Called synchronously by the call that caused the change, after the breaker
/// lock has been released, so implementations may inspect the breaker.
/// Keep it quick: the triggering caller waits for it.
pub trait TransitionListener: Send + Sync {
    fn on_transition(&self, name: &str, from: Phase, to: Phase, reason: &TransitionReason);
}

impl<F> TransitionListener for F
where
    F: Fn(&str, Phase, Phase, &TransitionReason) + Send + Sync,
{
    fn on_transition(&self, name: &str, from: Phase, to: Phase, reason: &TransitionReason) {
        self(name, from, to, reason)
    }
}

pub(crate) fn log_transition(name: &str, from: Phase, to: Phase, reason: &TransitionReason) {
    match to {
        Phase::Open => tracing::warn!(breaker = %name, %from, %to, %reason, "Circuit opened"),
        Phase::HalfOpen => tracing::info!(breaker = %name, %from, %to, %reason, "Circuit half-open, probing"),
        Phase::Closed => tracing::info!(breaker = %name, %from, %to, %reason, "Circuit closed"),
    }
}

impl Debug for dyn TransitionListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TransitionListener")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_is_a_listener() {
        let seen = Mutex::new(Vec::new());
        let listener = |name: &str, from: Phase, to: Phase, _reason: &TransitionReason| {
            seen.lock().unwrap().push((name.to_string(), from, to));
        };

        listener.on_transition("db", Phase::Closed, Phase::Open, &TransitionReason::ProbeFailed);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[("db".to_string(), Phase::Closed, Phase::Open)]
        );
    }
}
