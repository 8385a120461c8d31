//! Scenario state: session definitions, the rule-engine seam and the
//! [`Interpreter`] that owns the variable context.

mod engine;
mod interpreter;
mod meta;

pub use engine::{RuleSession, SessionFactory, TimeUnit, parse_duration};
pub use interpreter::{Interpreter, InterpreterBuilder};
pub use meta::{ScenarioMeta, SessionDirectiveBlock, wildcard_match};
