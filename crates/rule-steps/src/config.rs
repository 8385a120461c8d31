//! Configuration types for rule-steps.
//!
//! This module defines the interpreter configuration: where resources are
//! looked up, the defaults applied to session definitions, and logging.
//! Configuration can be built in code, loaded from a file (see [`file`]) and
//! overridden from the environment (see [`env`]).

pub mod env;
pub mod file;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

pub use env::{DEFAULT_PREFIX, EnvConfig};
pub use file::{ConfigFormat, ConfigLoader, parse_config};

/// Default log filter directive.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Top-level interpreter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Resource lookup configuration.
    pub resources: ResourceConfig,

    /// Defaults for session definitions.
    pub session: SessionDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl InterpreterConfig {
    /// Create a configuration with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_config(content, ConfigFormat::Toml)
    }

    /// Load a configuration file, detecting the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().load(path.as_ref())
    }

    /// Add a resource root directory.
    #[must_use]
    pub fn resource_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.resources.roots.push(path.into());
        self
    }

    /// Set the session defaults.
    #[must_use]
    pub const fn session(mut self, session: SessionDefaults) -> Self {
        self.session = session;
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Apply overrides from the environment.
    #[must_use]
    pub fn with_env(mut self, env: &EnvConfig) -> Self {
        env.apply(&mut self);
        self
    }
}

/// Where `classpath:` style resources are looked up.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    /// Root directories, searched in order.
    pub roots: Vec<PathBuf>,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(".")],
        }
    }
}

impl ResourceConfig {
    /// Create a configuration with the given roots.
    #[must_use]
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }
}

/// Flag defaults for session definitions that do not mention them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    /// Log the loaded rule resources.
    pub log_resources: bool,

    /// Log fact insertions and retractions.
    pub log_facts: bool,

    /// Keep a history of facts for later assertions.
    pub keep_facts_history: bool,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            log_resources: false,
            log_facts: true,
            keep_facts_history: true,
        }
    }
}

impl SessionDefaults {
    /// Set whether resources are logged.
    #[must_use]
    pub const fn log_resources(mut self, enabled: bool) -> Self {
        self.log_resources = enabled;
        self
    }

    /// Set whether facts are logged.
    #[must_use]
    pub const fn log_facts(mut self, enabled: bool) -> Self {
        self.log_facts = enabled;
        self
    }

    /// Set whether fact history is kept.
    #[must_use]
    pub const fn keep_facts_history(mut self, enabled: bool) -> Self {
        self.keep_facts_history = enabled;
        self
    }
}

/// Configuration for logging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `rule_steps=debug`.
    pub level: String,

    /// Whether to include the event target in log lines.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter directive.
    #[must_use]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set whether targets are shown.
    #[must_use]
    pub const fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = InterpreterConfig::default();
        assert_eq!(config.resources.roots, vec![PathBuf::from(".")]);
        assert!(!config.session.log_resources);
        assert!(config.session.log_facts);
        assert!(config.session.keep_facts_history);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn builder() {
        let config = InterpreterConfig::new()
            .resource_root("src/test/resources")
            .session(SessionDefaults::default().log_facts(false))
            .logging(LoggingConfig::new().level("rule_steps=debug").with_target(false));

        assert_eq!(config.resources.roots.len(), 2);
        assert!(!config.session.log_facts);
        assert_eq!(config.logging.level, "rule_steps=debug");
        assert!(!config.logging.with_target);
    }

    #[test]
    fn from_toml_str_and_load() {
        let text = "[session]\nlog_facts = false\n";
        let config = InterpreterConfig::from_toml_str(text).unwrap();
        assert!(!config.session.log_facts);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("steps.toml");
        std::fs::write(&path, text).unwrap();
        assert_eq!(InterpreterConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn resource_config_new() {
        let resources = ResourceConfig::new(["a", "b"]);
        assert_eq!(resources.roots, vec![PathBuf::from("a"), PathBuf::from("b")]);
    }
}
