//! Faults raised by a breaker.

use std::time::Duration;
use thiserror::Error;

use crate::resilience::state::Phase;

/// Why a single attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError<E> {
    /// The operation returned an error.
    #[error("operation failed: {0}")]
    Operation(E),

    /// The attempt exceeded `call_timeout`.
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
}

impl<E> AttemptError<E> {
    /// Classification recorded in the outcome window.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Operation(_) => "operation",
            AttemptError::Timeout(_) => "timeout",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptError::Timeout(_))
    }
}

/// The call was rejected without attempting the operation.
///
/// Always safe to retry later; the caller picks the fallback.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("circuit '{name}' is {phase}, call rejected")]
pub struct CircuitOpenFault {
    pub name: String,
    /// Phase that rejected the call (open, or half-open with probe slots full).
    pub phase: Phase,
    /// Remaining open time, when known.
    pub retry_after: Option<Duration>,
}

/// The operation failed on its final attempt.
#[derive(Debug, Error)]
#[error("circuit '{name}': call failed after {attempts} attempt(s) in {elapsed:?}: {source}")]
pub struct CircuitCallFault<E> {
    pub name: String,
    #[source]
    pub source: AttemptError<E>,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Error returned by [`Breaker::execute`](crate::Breaker::execute).
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    #[error(transparent)]
    Open(#[from] CircuitOpenFault),

    #[error(transparent)]
    Call(#[from] CircuitCallFault<E>),
}

impl<E> BreakerError<E> {
    /// True when the breaker rejected the call without running it.
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open(_))
    }

    /// The operation's own error, if the final attempt returned one.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            BreakerError::Call(CircuitCallFault {
                source: AttemptError::Operation(e),
                ..
            }) => Some(e),
            _ => None,
        }
    }
}
