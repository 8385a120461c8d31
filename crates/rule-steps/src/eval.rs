//! Expression evaluation.
//!
//! The interpreter never evaluates expressions itself; it hands them to an
//! [`ExpressionEvaluator`] together with the session's [`VariableContext`].
//! [`RhaiEvaluator`] is the default implementation, backed by the Rhai
//! scripting engine.

pub mod context;
pub mod engine;
pub mod types;

pub use context::{ExportedGlobals, VariableContext};
pub use engine::RhaiEvaluator;
pub use types::{BindableType, TypeHandle, TypeRegistry};

use crate::error::Result;

/// A runtime value bound to a variable.
pub type Value = rhai::Dynamic;

/// Evaluates expression text against a variable context.
pub trait ExpressionEvaluator {
    /// Evaluate `expression`, reading and possibly binding variables in `context`.
    ///
    /// Failures are reported as [`StepError::UnresolvableExpression`] carrying
    /// the expression text.
    ///
    /// [`StepError::UnresolvableExpression`]: crate::StepError::UnresolvableExpression
    fn evaluate(&self, expression: &str, context: &mut VariableContext) -> Result<Value>;

    /// Resolve a type name, honouring the namespaces imported into `context`.
    fn resolve_type(&self, name: &str, context: &VariableContext) -> Result<TypeHandle>;

    /// Check that `name` can be bound as a variable.
    ///
    /// Rejected names are reported as [`StepError::MalformedDirective`].
    ///
    /// [`StepError::MalformedDirective`]: crate::StepError::MalformedDirective
    fn validate_name(&self, name: &str) -> Result<()> {
        let _ = name;
        Ok(())
    }

    /// Compare two values for equality.
    ///
    /// The default knows only builtin values; evaluators with registered
    /// types should compare those with the types' own equality.
    fn values_equal(&self, left: &Value, right: &Value) -> bool {
        TypeRegistry::new().values_equal(left, right)
    }
}

/// Render a value the way placeholders are substituted.
///
/// Unit (the evaluator's null) renders as the empty string.
#[must_use]
pub fn render(value: &Value) -> String {
    if value.is_unit() {
        String::new()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_unit_is_empty() {
        assert_eq!(render(&Value::UNIT), "");
    }

    #[test]
    fn render_scalars() {
        assert_eq!(render(&Value::from(42_i64)), "42");
        assert_eq!(render(&Value::from("text".to_string())), "text");
        assert_eq!(render(&Value::from(true)), "true");
    }
}
