//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker::execute / Breaker::reset emit:
//!     → tracing events (rejections, retries, transitions)
//!     → metrics.rs (per-breaker counters, phase gauge, call latency)
//!     → TransitionListener callbacks (host-provided)
//!
//! Hosts choose the sinks:
//!     → logging.rs installs a subscriber writing to stderr
//!     → metrics.rs installs a Prometheus recorder or HTTP endpoint
//! ```
//!
//! # Design Decisions
//! - The library never installs a subscriber or recorder on its own
//! - Breaker name is a field/label on every event
//! - Without a recorder the metric macros cost next to nothing

pub mod logging;
pub mod metrics;
