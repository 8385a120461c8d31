//! External service lookup for `spring service` directives.

use std::collections::HashMap;

use crate::error::{Result, StepError};
use crate::eval::Value;

/// Looks up named services from an external registry.
///
/// The default implementation reports the lookup as unsupported, so a
/// harness without a registry fails such directives with a clear message.
pub trait ServiceLocator {
    /// Find the service registered under `key`.
    fn lookup(&self, key: &str) -> Result<Value> {
        let _ = key;
        Err(StepError::unsupported("spring service lookup"))
    }
}

/// A locator with no registry behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoServices;

impl ServiceLocator for NoServices {}

/// A fixed set of named services.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Value>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under a key.
    #[must_use]
    pub fn with_service(mut self, key: impl Into<String>, service: Value) -> Self {
        self.services.insert(key.into(), service);
        self
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Check if no service is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceLocator for ServiceRegistry {
    fn lookup(&self, key: &str) -> Result<Value> {
        self.services
            .get(key)
            .cloned()
            .ok_or_else(|| StepError::unresolvable(key, "no service registered under this name"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_services_is_unsupported() {
        let err = NoServices.lookup("restTemplate").unwrap_err();
        assert!(err.is_unsupported());
        assert!(err.to_string().contains("not implemented"));
    }

    #[test]
    fn registry_lookup() {
        let registry = ServiceRegistry::new().with_service("clock", Value::from(42_i64));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("clock").unwrap().as_int(), Ok(42));
        assert!(registry.lookup("other").is_err());
    }
}
