//! rule-steps: step-sentence interpreter for rule-engine scenario tests
//!
//! This crate turns human-readable BDD step sentences into typed runtime
//! bindings and feeds them into a rule-engine test harness.
//!
//! # Features
//!
//! - **Placeholder substitution** of `${expr}` and `$${expr}$` in step text
//! - **Variable directives** such as `dial as Dialing from yaml resource classpath:/dial.yaml`
//! - **Session definitions** with resources, properties, ignored rules and flags
//! - **Activation counts** parsed from `'rule' - 3` style lists
//! - **Rhai** as the default expression language, behind a trait
//! - **Mock rule session** for testing (feature: `mock`)
//! - **Log subscriber setup** (feature: `subscriber`)
//!
//! # Example
//!
//! ```
//! use rule_steps::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let mut interpreter = Interpreter::new();
//! interpreter.interpret_variable_directive("calls is 3", false)?;
//! interpreter.interpret_variable_directive("cfg is json {\"limit\": ${calls * 2}}", false)?;
//!
//! assert_eq!(interpreter.substitute("limit ${cfg.limit}")?, "limit 6");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod counts;
pub mod directive;
pub mod error;
pub mod eval;
pub mod prelude;
pub mod resource;
pub mod service;
pub mod session;
pub mod steps;
pub mod text;

/// In-memory collaborators for testing.
#[cfg(any(test, feature = "mock"))]
pub mod mock;

/// Log subscriber setup.
#[cfg(feature = "subscriber")]
pub mod logging;

pub use config::{InterpreterConfig, LoggingConfig, ResourceConfig, SessionDefaults};
pub use counts::{ActivationCountMap, parse_counts};
pub use directive::{ContentKind, Directive, Resolver};
pub use error::{Result, StepError};
pub use eval::{
    BindableType, ExportedGlobals, ExpressionEvaluator, RhaiEvaluator, TypeHandle, TypeRegistry,
    Value, VariableContext,
};
pub use resource::{ClasspathLoader, ResourceLoader};
pub use service::{NoServices, ServiceLocator, ServiceRegistry};
pub use session::{
    Interpreter, InterpreterBuilder, RuleSession, ScenarioMeta, SessionDirectiveBlock,
    SessionFactory, TimeUnit,
};
pub use steps::ScenarioSteps;
