//! Variable bindings shared by the directives of one session scope.

use std::collections::HashMap;

use super::Value;

/// Named variables and imported namespaces visible to expressions.
///
/// A later binding of a name overwrites the earlier one; nothing is removed
/// implicitly. Resetting a session scope replaces the whole context with a
/// fresh instance instead of clearing this one.
#[derive(Debug, Clone, Default)]
pub struct VariableContext {
    bindings: HashMap<String, Value>,
    namespaces: Vec<String>,
}

impl VariableContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable, returning the previous value if any.
    pub fn define(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.bindings.insert(name.into(), value)
    }

    /// Look up a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// Check if a variable is bound.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Iterate over all bindings.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bindings.iter()
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if no variables are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Import a namespace so bare type names inside it resolve.
    ///
    /// Importing the same namespace twice has no effect.
    pub fn import_namespace(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        if !self.namespaces.contains(&namespace) {
            self.namespaces.push(namespace);
        }
    }

    /// Imported namespaces, in import order.
    #[must_use]
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }
}

/// Variables exported to the rule engine's global namespace.
#[derive(Debug, Clone, Default)]
pub struct ExportedGlobals {
    values: HashMap<String, Value>,
}

impl ExportedGlobals {
    /// Create an empty set of globals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Export a value, returning the previously exported one if any.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    /// Look up an exported value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Iterate over exported values.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Number of exported values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if nothing is exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_returns_previous() {
        let mut ctx = VariableContext::new();
        assert!(ctx.define("x", Value::from(1_i64)).is_none());
        let previous = ctx.define("x", Value::from(2_i64)).unwrap();
        assert_eq!(previous.as_int(), Ok(1));
        assert_eq!(ctx.get("x").unwrap().as_int(), Ok(2));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn names_are_case_sensitive() {
        let mut ctx = VariableContext::new();
        ctx.define("x", Value::from(1_i64));
        assert!(ctx.contains("x"));
        assert!(!ctx.contains("X"));
    }

    #[test]
    fn namespaces_deduplicate() {
        let mut ctx = VariableContext::new();
        ctx.import_namespace("org.acme");
        ctx.import_namespace("org.acme");
        ctx.import_namespace("org.other");
        assert_eq!(ctx.namespaces(), ["org.acme", "org.other"]);
    }

    #[test]
    fn globals_basic() {
        let mut globals = ExportedGlobals::new();
        assert!(globals.is_empty());
        globals.insert("stdout", Value::from(true));
        assert_eq!(globals.len(), 1);
        assert!(globals.get("stdout").is_some());
    }
}
