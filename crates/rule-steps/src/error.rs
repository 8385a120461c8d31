//! Error types for rule-steps.
//!
//! Every error carries the raw text that caused it so a failing step can be
//! diagnosed from the test report alone. Resolution errors wrap their
//! underlying cause together with the directive's content kind, declared type
//! and expression.

use std::path::PathBuf;

use thiserror::Error;

use crate::directive::ContentKind;

/// Maximum length of step text to display in error messages.
const MAX_TEXT_DISPLAY: usize = 200;

/// Format step text for display, truncating if necessary.
fn format_text_snippet(text: &str) -> String {
    if text.is_empty() {
        return "(empty text)".to_string();
    }

    if text.len() <= MAX_TEXT_DISPLAY {
        return format!("'{text}'");
    }

    let mut cut = MAX_TEXT_DISPLAY;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("'{}...' ({} bytes)", &text[..cut], text.len())
}

/// Format a resolution failure message.
fn format_resolution_error(
    kind: ContentKind,
    declared_type: Option<&str>,
    expression: &str,
    source: &StepError,
) -> String {
    format!(
        "cannot resolve variable {} from {kind}, expression: {}\n\
         \n\
         Caused by: {source}",
        declared_type.unwrap_or("(untyped)"),
        format_text_snippet(expression),
    )
}

/// The main error type for rule-steps operations.
#[derive(Debug, Error)]
pub enum StepError {
    /// The sentence does not match the expected grammar.
    #[error("malformed directive: {message}: {}", format_text_snippet(text))]
    MalformedDirective {
        /// What is wrong with the sentence.
        message: String,
        /// The offending text, verbatim.
        text: String,
    },

    /// The expression evaluator failed.
    #[error("cannot evaluate {}: {cause}", format_text_snippet(expression))]
    UnresolvableExpression {
        /// The original expression text.
        expression: String,
        /// Description of the underlying evaluator failure.
        cause: String,
    },

    /// A resolution strategy failed.
    #[error("{}", format_resolution_error(*kind, declared_type.as_deref(), expression, source))]
    ResolutionFailure {
        /// Content kind the directive was dispatched on.
        kind: ContentKind,
        /// Declared type, if the directive had one.
        declared_type: Option<String>,
        /// Raw expression text.
        expression: String,
        /// The underlying failure.
        #[source]
        source: Box<StepError>,
    },

    /// A strategy was invoked that has no implementation.
    #[error("{strategy} is not implemented, provide an implementation to use it")]
    UnsupportedStrategy {
        /// Name of the strategy.
        strategy: String,
    },

    /// A type name is not registered.
    #[error("unknown type: {name}")]
    UnknownType {
        /// The name that could not be resolved.
        name: String,
    },

    /// A session query declared type is not `<Type> object(s)`.
    #[error("cannot resolve variable from the session using '{declared_type}'")]
    InvalidSessionQuery {
        /// The declared type as written.
        declared_type: String,
    },

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A resource could not be read.
    #[error("cannot load resource {locator}: {source}")]
    Resource {
        /// The resource locator as written.
        locator: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A resource locator did not resolve to any file.
    #[error("resource not found: {locator} (searched {searched:?})")]
    ResourceNotFound {
        /// The resource locator as written.
        locator: String,
        /// The candidate paths that were tried.
        searched: Vec<PathBuf>,
    },

    /// An operation needs a rule session but none is attached.
    #[error("no rule session, define a new session for the scenario first")]
    NoRuleSession,

    /// The rule-engine collaborator reported a failure.
    #[error("rule engine error: {message}")]
    RuleEngine {
        /// Description of the failure.
        message: String,
    },

    /// A step assertion did not hold.
    #[error("assertion failed: {message}")]
    AssertionFailed {
        /// Description of the failed assertion.
        message: String,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for rule-steps operations.
pub type Result<T> = std::result::Result<T, StepError>;

impl StepError {
    /// Create a malformed directive error.
    pub fn malformed(message: impl Into<String>, text: impl Into<String>) -> Self {
        Self::MalformedDirective {
            message: message.into(),
            text: text.into(),
        }
    }

    /// Create an unresolvable expression error.
    pub fn unresolvable(expression: impl Into<String>, cause: impl ToString) -> Self {
        Self::UnresolvableExpression {
            expression: expression.into(),
            cause: cause.to_string(),
        }
    }

    /// Wrap a strategy failure with the directive that triggered it.
    pub fn resolution(
        kind: ContentKind,
        declared_type: Option<&str>,
        expression: impl Into<String>,
        source: Self,
    ) -> Self {
        Self::ResolutionFailure {
            kind,
            declared_type: declared_type.map(str::to_string),
            expression: expression.into(),
            source: Box::new(source),
        }
    }

    /// Create an unsupported strategy error.
    pub fn unsupported(strategy: impl Into<String>) -> Self {
        Self::UnsupportedStrategy {
            strategy: strategy.into(),
        }
    }

    /// Create an unknown type error.
    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    /// Create a resource error.
    pub fn resource(locator: impl Into<String>, source: std::io::Error) -> Self {
        Self::Resource {
            locator: locator.into(),
            source,
        }
    }

    /// Create a rule engine error.
    pub fn rule_engine(message: impl Into<String>) -> Self {
        Self::RuleEngine {
            message: message.into(),
        }
    }

    /// Create an assertion failure.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The innermost error, looking through resolution wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::ResolutionFailure { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this is a malformed directive error.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedDirective { .. })
    }

    /// Check if the root cause is an evaluator failure.
    #[must_use]
    pub fn is_unresolvable(&self) -> bool {
        matches!(self.root(), Self::UnresolvableExpression { .. })
    }

    /// Check if the root cause is an unimplemented strategy.
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self.root(), Self::UnsupportedStrategy { .. })
    }

    /// Get the offending raw text if this error carries it.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::MalformedDirective { text, .. } => Some(text),
            Self::UnresolvableExpression { expression, .. }
            | Self::ResolutionFailure { expression, .. } => Some(expression),
            Self::Resource { locator, .. } | Self::ResourceNotFound { locator, .. } => {
                Some(locator)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display() {
        let err = StepError::malformed("no connective", "ruleC");
        let msg = err.to_string();
        assert!(msg.contains("malformed directive"));
        assert!(msg.contains("'ruleC'"));
        assert!(err.is_malformed());
    }

    #[test]
    fn snippet_empty() {
        assert_eq!(format_text_snippet(""), "(empty text)");
    }

    #[test]
    fn snippet_truncates_long_text() {
        let long = "x".repeat(500);
        let snippet = format_text_snippet(&long);
        assert!(snippet.contains("..."));
        assert!(snippet.contains("500 bytes"));
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let long = "é".repeat(150);
        let snippet = format_text_snippet(&long);
        assert!(snippet.ends_with("(300 bytes)"));
    }

    #[test]
    fn resolution_wraps_cause() {
        let err = StepError::resolution(
            ContentKind::Json,
            Some("Foo"),
            "{bad",
            StepError::unknown_type("Foo"),
        );
        let msg = err.to_string();
        assert!(msg.contains("cannot resolve variable Foo from json"));
        assert!(msg.contains("{bad"));
        assert!(msg.contains("unknown type: Foo"));
        assert!(matches!(err.root(), StepError::UnknownType { .. }));
        assert_eq!(err.text(), Some("{bad"));
    }

    #[test]
    fn root_looks_through_wrappers() {
        let err = StepError::resolution(
            ContentKind::ServiceLookup,
            None,
            "restTemplate",
            StepError::unsupported("service lookup"),
        );
        assert!(err.is_unsupported());
        assert!(!err.is_unresolvable());
    }

    #[test]
    fn unresolvable_display() {
        let err = StepError::unresolvable("1 +", "syntax error");
        let msg = err.to_string();
        assert!(msg.contains("cannot evaluate '1 +'"));
        assert!(msg.contains("syntax error"));
        assert!(err.is_unresolvable());
    }

    #[test]
    fn resource_error_carries_locator() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = StepError::resource("classpath:/a.json", io);
        assert_eq!(err.text(), Some("classpath:/a.json"));
        assert!(err.to_string().contains("missing"));
    }
}
