//! Named breaker registry.
//!
//! # Responsibilities
//! - Hold one breaker per dependency name for the life of the process
//! - Create breakers on first use from explicit settings or the defaults
//! - Export snapshots of every breaker
//!
//! # Design Decisions
//! - An explicit object the host passes around, not a global
//! - `DashMap` entry API makes first-use creation race-free
//! - Breakers are handed out as `Arc<Breaker>` and never replaced

use std::collections::HashMap;
use std::sync::Arc;
use dashmap::DashMap;

use crate::clock::{Clock, TokioClock};
use crate::config::{BreakerConfig, ConfigError, FileConfig};
use crate::resilience::breaker::{Breaker, BreakerSnapshot};
use crate::resilience::listener::TransitionListener;

/// Registry of named breakers.
#[derive(Debug)]
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<Breaker>>,
    configured: HashMap<String, BreakerConfig>,
    defaults: BreakerConfig,
    clock: Arc<dyn Clock>,
    listener: Option<Arc<dyn TransitionListener>>,
}

impl BreakerRegistry {
    /// Registry whose breakers all start from `defaults` (name replaced).
    pub fn new(defaults: BreakerConfig) -> Result<Self, ConfigError> {
        defaults.validate().map_err(ConfigError::Validation)?;
        Ok(Self {
            breakers: DashMap::new(),
            configured: HashMap::new(),
            defaults,
            clock: Arc::new(TokioClock),
            listener: None,
        })
    }

    /// Registry built from a loaded configuration file.
    pub fn from_config(config: &FileConfig) -> Result<Self, ConfigError> {
        let mut defaults = config.defaults.to_config();
        defaults.name = "defaults".to_string();
        let mut registry = Self::new(defaults)?;

        for settings in &config.breakers {
            let breaker = settings.to_config();
            breaker.validate().map_err(ConfigError::Validation)?;
            registry.configured.insert(breaker.name.clone(), breaker);
        }
        Ok(registry)
    }

    /// Time source for breakers created from now on.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Listener attached to breakers created from now on.
    pub fn with_listener(mut self, listener: Arc<dyn TransitionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// The breaker for `name`, creating it on first use.
    pub fn get_or_create(&self, name: &str) -> Arc<Breaker> {
        if let Some(existing) = self.breakers.get(name) {
            return existing.value().clone();
        }

        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                let config = self
                    .configured
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| BreakerConfig {
                        name: name.to_string(),
                        ..self.defaults.clone()
                    });
                tracing::debug!(breaker = %name, "Creating breaker");
                Arc::new(self.build(config))
            })
            .value()
            .clone()
    }

    /// The breaker for `name` if it has been created.
    pub fn get(&self, name: &str) -> Option<Arc<Breaker>> {
        self.breakers.get(name).map(|r| r.value().clone())
    }

    /// Create a breaker with its own configuration.
    ///
    /// Returns the existing breaker unchanged if the name is already in use.
    pub fn register(&self, config: BreakerConfig) -> Result<Arc<Breaker>, ConfigError> {
        config.validate().map_err(ConfigError::Validation)?;
        let name = config.name.clone();
        Ok(self
            .breakers
            .entry(name)
            .or_insert_with(|| Arc::new(self.build(config)))
            .value()
            .clone())
    }

    /// Snapshots of every created breaker, sorted by name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let breakers: Vec<Arc<Breaker>> = self.breakers.iter().map(|r| r.value().clone()).collect();
        let mut snapshots: Vec<_> = breakers.iter().map(|b| b.snapshot()).collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    // Configs reaching here are already validated
    fn build(&self, config: BreakerConfig) -> Breaker {
        let mut breaker = Breaker::from_validated(config).with_clock(self.clock.clone());
        if let Some(listener) = &self.listener {
            breaker = breaker.with_listener(listener.clone());
        }
        breaker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BreakerSettings;

    #[test]
    fn test_get_or_create_returns_same_breaker() {
        let registry = BreakerRegistry::new(BreakerConfig::default()).unwrap();
        assert!(registry.get("billing").is_none());

        let first = registry.get_or_create("billing");
        let second = registry.get_or_create("billing");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "billing");
        assert_eq!(registry.len(), 1);
        assert!(registry.get("billing").is_some());
    }

    #[test]
    fn test_configured_breakers_use_their_settings() {
        let mut config = FileConfig::default();
        config.breakers.push(BreakerSettings {
            name: "payments".into(),
            minimum_throughput: 4,
            ..BreakerSettings::default()
        });

        let registry = BreakerRegistry::from_config(&config).unwrap();
        assert_eq!(registry.get_or_create("payments").config().minimum_throughput, 4);

        let other = registry.get_or_create("search");
        assert_eq!(other.config().minimum_throughput, BreakerConfig::default().minimum_throughput);
        assert_eq!(other.name(), "search");
    }

    #[test]
    fn test_register_validates_and_keeps_existing() {
        let registry = BreakerRegistry::new(BreakerConfig::default()).unwrap();
        assert!(registry
            .register(BreakerConfig::new("bad").with_failure_rate_threshold(2.0))
            .is_err());

        let first = registry.register(BreakerConfig::new("queue").with_minimum_throughput(3)).unwrap();
        let second = registry.register(BreakerConfig::new("queue").with_minimum_throughput(9)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.config().minimum_throughput, 3);
    }

    #[test]
    fn test_snapshots_sorted_by_name() {
        let registry = BreakerRegistry::new(BreakerConfig::default()).unwrap();
        registry.get_or_create("zeta");
        registry.get_or_create("alpha");

        let names: Vec<_> = registry.snapshots().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_invalid_defaults_rejected() {
        let err = BreakerRegistry::new(BreakerConfig::default().with_half_open_max_in_flight(0)).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
