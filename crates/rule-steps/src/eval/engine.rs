//! Rhai-backed expression evaluator.

use rhai::{Engine, Scope};

use super::{BindableType, ExpressionEvaluator, TypeHandle, TypeRegistry, Value, VariableContext};
use crate::error::{Result, StepError};

/// Rhai keywords and reserved symbols that cannot name a variable.
const RESERVED: &[&str] = &[
    "true", "false", "let", "const", "if", "else", "switch", "do", "while", "loop", "until",
    "for", "in", "continue", "break", "return", "throw", "try", "catch", "import", "export",
    "as", "global", "private", "fn", "Fn", "call", "curry", "this", "is_def_var", "is_def_fn",
    "is_shared", "type_of", "print", "debug", "eval", "var", "static", "shared", "goto", "exit",
    "match", "case", "public", "protected", "new", "use", "with", "module", "package", "super",
    "thread", "spawn", "go", "await", "async", "sync", "yield", "default", "void", "null", "nil",
];

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name != "_"
}

/// Evaluates expressions with the Rhai scripting engine.
///
/// Context bindings are pushed into a fresh Rhai scope for every evaluation
/// and copied back afterwards, so assignments and `let` statements inside an
/// expression become visible to later directives. A failed evaluation leaves
/// the context untouched.
pub struct RhaiEvaluator {
    engine: Engine,
    types: TypeRegistry,
}

impl Default for RhaiEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RhaiEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RhaiEvaluator")
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}

impl RhaiEvaluator {
    /// Create an evaluator with the builtin types registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            engine: Engine::new(),
            types: TypeRegistry::with_builtins(),
        }
    }

    /// Register a Rust type under a (possibly qualified) name.
    ///
    /// The type becomes available to JSON/YAML directives and session
    /// queries, and is known to Rhai by its simple name.
    pub fn register_type<T>(&mut self, name: &str) -> &mut Self
    where
        T: BindableType,
    {
        let handle = TypeHandle::of::<T>(name);
        self.engine.register_type_with_name::<T>(handle.simple_name());
        self.types.register(handle);
        self
    }

    /// Builder form of [`register_type`](Self::register_type).
    #[must_use]
    pub fn with_type<T>(mut self, name: &str) -> Self
    where
        T: BindableType,
    {
        self.register_type::<T>(name);
        self
    }

    /// The underlying engine, for registering functions and getters.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// The registered types.
    #[must_use]
    pub const fn types(&self) -> &TypeRegistry {
        &self.types
    }
}

impl ExpressionEvaluator for RhaiEvaluator {
    fn evaluate(&self, expression: &str, context: &mut VariableContext) -> Result<Value> {
        let mut scope = Scope::new();
        for (name, value) in context.iter() {
            scope.push_dynamic(name.as_str(), value.clone());
        }

        let result = self
            .engine
            .eval_with_scope::<Value>(&mut scope, expression)
            .map_err(|e| StepError::unresolvable(expression, e))?;

        let bindings: Vec<(String, Value)> = scope
            .iter()
            .map(|(name, _, value)| (name.to_string(), value))
            .collect();
        for (name, value) in bindings {
            context.define(name, value);
        }

        tracing::trace!(expression, result = %result.type_name(), "evaluated");
        Ok(result)
    }

    fn resolve_type(&self, name: &str, context: &VariableContext) -> Result<TypeHandle> {
        self.types.resolve(name, context.namespaces())
    }

    fn validate_name(&self, name: &str) -> Result<()> {
        if !is_identifier(name) {
            return Err(StepError::malformed("variable name is not an identifier", name));
        }
        if RESERVED.contains(&name) {
            return Err(StepError::malformed("variable name is a reserved word", name));
        }
        Ok(())
    }

    fn values_equal(&self, left: &Value, right: &Value) -> bool {
        self.types.values_equal(left, right)
    }
}
