//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker::execute(operation):
//!     → state.rs (admission check: closed / open / half-open probe slot)
//!     → retries.rs (attempt loop)
//!         → timeouts.rs (enforce call_timeout per attempt)
//!         → backoff.rs (exponential delay between attempts)
//!     → window.rs (record final outcome, derive failure rate)
//!     → state.rs (re-evaluate phase)
//!     → listener.rs (notify host of transitions)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Only the final attempt of a call is recorded
//! - The breaker never fails on its own: it rejects, or passes the operation's
//!   final error through
//! - No background tasks; open expiry is checked at call time

pub mod backoff;
pub mod breaker;
pub mod error;
pub mod listener;
pub mod retries;
pub mod state;
pub mod timeouts;
pub mod window;
