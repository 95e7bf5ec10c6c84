use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::circuit::CircuitBreaker;
use crate::config::CircuitBreakerConfig;

/// Returns the same [`CircuitBreaker`] instance for a given name across the
/// process, creating it with `default_config` (name overridden to match) on
/// first use. Mirrors a `get_circuit_breaker(name)` lookup backed by a
/// process-wide registry rather than ad hoc global state.
#[derive(Default)]
pub struct CircuitBreakerRegistry {
    breakers: Mutex<HashMap<String, CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create(&self, name: &str, default_config: CircuitBreakerConfig) -> CircuitBreaker {
        let mut breakers = self.breakers.lock().await;
        breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                let mut config = default_config;
                config.name = name.to_string();
                CircuitBreaker::new(config)
            })
            .clone()
    }

    pub async fn get(&self, name: &str) -> Option<CircuitBreaker> {
        self.breakers.lock().await.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_name_returns_same_instance() {
        let registry = CircuitBreakerRegistry::new();
        let a = registry
            .get_or_create("notify", CircuitBreakerConfig::default())
            .await;
        a.record_failure().await;
        let b = registry
            .get_or_create("notify", CircuitBreakerConfig::default())
            .await;
        assert_eq!(b.status().await.failure_count, 1);
    }
}
