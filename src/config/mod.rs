//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! breakwater.toml
//!     → loader::load_config (read file, toml::from_str into FileConfig)
//!     → validation::validate_config (every rule, every breaker)
//!     → BreakerSettings::to_config() → BreakerConfig (Durations)
//!     → BreakerRegistry / Breaker::new (validated again on construction)
//! ```
//!
//! # Design Decisions
//! - Loaded once at startup; a breaker keeps its config for life
//! - Every field has a default, so an empty file is a valid file
//! - Serde handles syntax, `validation.rs` handles meaning
//! - Programmatic callers skip the file and build `BreakerConfig` directly;
//!   the same validation runs when a breaker is constructed

pub mod breaker;
pub mod loader;
pub mod schema;
pub mod validation;

pub use breaker::BreakerConfig;
pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{BreakerSettings, FileConfig, LogFormat, ObservabilityConfig};
pub use validation::ValidationError;
