//! In-process circuit breakers for unreliable dependencies.

pub mod clock;
pub mod config;
pub mod observability;
pub mod registry;
pub mod resilience;

pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{BreakerConfig, ConfigError, FileConfig};
pub use registry::BreakerRegistry;
pub use resilience::breaker::{Breaker, BreakerSnapshot};
pub use resilience::error::{AttemptError, BreakerError, CircuitCallFault, CircuitOpenFault};
pub use resilience::listener::TransitionListener;
pub use resilience::state::{Phase, TransitionReason};
pub use resilience::window::{Outcome, OutcomeWindow};
