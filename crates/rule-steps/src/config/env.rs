//! Environment-based configuration.

use std::collections::HashMap;
use std::path::PathBuf;

use super::InterpreterConfig;

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "RULE_STEPS";

/// Environment variable reader.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Values that take precedence over the process environment.
    overrides: HashMap<String, String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a new environment config reader.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: HashMap::new(),
        }
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Pin a value without touching the process environment.
    #[must_use]
    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        let var_name = self.var_name(name);
        self.overrides.insert(var_name, value.into());
        self
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        self.overrides
            .get(&var_name)
            .cloned()
            .or_else(|| std::env::var(&var_name).ok())
    }

    /// Get a boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| {
            matches!(
                v.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on" | "enabled"
            )
        })
    }

    /// Get a path list separated the platform way.
    #[must_use]
    pub fn paths(&self, name: &str) -> Option<Vec<PathBuf>> {
        self.get(name)
            .map(|v| std::env::split_paths(&v).collect::<Vec<_>>())
            .filter(|paths| !paths.is_empty())
    }

    /// Check if a variable is set.
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Overwrite the fields of `config` whose variables are set.
    pub fn apply(&self, config: &mut InterpreterConfig) {
        if let Some(roots) = self.paths(vars::RESOURCE_ROOTS) {
            config.resources.roots = roots;
        }
        if let Some(enabled) = self.bool(vars::LOG_RESOURCES) {
            config.session.log_resources = enabled;
        }
        if let Some(enabled) = self.bool(vars::LOG_FACTS) {
            config.session.log_facts = enabled;
        }
        if let Some(enabled) = self.bool(vars::KEEP_FACTS_HISTORY) {
            config.session.keep_facts_history = enabled;
        }
        if let Some(level) = self.get(vars::LOG_LEVEL) {
            config.logging.level = level;
        }
    }
}

/// Recognised environment variables, without prefix.
pub mod vars {
    /// Resource roots, separated like `PATH`.
    pub const RESOURCE_ROOTS: &str = "RESOURCE_ROOTS";
    /// Default for the `log resources` session flag.
    pub const LOG_RESOURCES: &str = "LOG_RESOURCES";
    /// Default for the `log facts` session flag.
    pub const LOG_FACTS: &str = "LOG_FACTS";
    /// Default for the `keep facts history` session flag.
    pub const KEEP_FACTS_HISTORY: &str = "KEEP_FACTS_HISTORY";
    /// Log filter directive.
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
}
