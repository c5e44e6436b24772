//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap each attempt with `call_timeout`
//! - Cancel the attempt cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the attempt future is dropped on expiry
//! - Timeout errors are distinct from operation errors
//! - A timed-out attempt counts as a failure and may be retried

use std::future::Future;
use std::time::Duration;

use crate::resilience::error::AttemptError;

/// Run one attempt under a deadline.
pub async fn with_timeout<Fut, T, E>(limit: Duration, attempt: Fut) -> Result<T, AttemptError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, attempt).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AttemptError::Operation(e)),
        Err(_) => Err(AttemptError::Timeout(limit)),
    }
}
