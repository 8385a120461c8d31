//! Convenient re-exports for common rule-steps usage.
//!
//! # Example
//!
//! ```
//! use rule_steps::prelude::*;
//!
//! let block = SessionDirectiveBlock::parse("classpath:/rules.drl\nlog facts: false");
//! assert!(!block.log_facts);
//! ```

// Interpreter and steps
pub use crate::session::{Interpreter, InterpreterBuilder, ScenarioMeta, SessionDirectiveBlock};
pub use crate::steps::ScenarioSteps;

// Configuration
pub use crate::config::{InterpreterConfig, LoggingConfig, ResourceConfig, SessionDefaults};

// Error handling
pub use crate::error::{Result, StepError};

// Values and evaluation
pub use crate::eval::{ExpressionEvaluator, RhaiEvaluator, TypeHandle, Value, VariableContext};

// Collaborator traits
pub use crate::resource::{ClasspathLoader, ResourceLoader};
pub use crate::service::{NoServices, ServiceLocator};
pub use crate::session::{RuleSession, SessionFactory};

// Parsing
pub use crate::counts::{ActivationCountMap, parse_counts};
pub use crate::directive::{ContentKind, Directive};
