//! The step-text interpreter.

use super::{RuleSession, SessionDirectiveBlock};
use crate::config::InterpreterConfig;
use crate::counts::{ActivationCountMap, parse_counts};
use crate::directive::{Directive, Resolver};
use crate::error::{Result, StepError};
use crate::eval::{ExportedGlobals, ExpressionEvaluator, RhaiEvaluator, Value, VariableContext};
use crate::resource::{ClasspathLoader, ResourceLoader};
use crate::service::{NoServices, ServiceLocator};
use crate::text;

/// Builder for [`Interpreter`].
///
/// Collaborators left unset get the in-process defaults: a
/// [`RhaiEvaluator`], a [`ClasspathLoader`] over the configured roots and
/// [`NoServices`].
#[derive(Default)]
pub struct InterpreterBuilder {
    config: InterpreterConfig,
    evaluator: Option<Box<dyn ExpressionEvaluator>>,
    resources: Option<Box<dyn ResourceLoader>>,
    services: Option<Box<dyn ServiceLocator>>,
}

impl InterpreterBuilder {
    /// Create a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    #[must_use]
    pub fn config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the expression evaluator.
    #[must_use]
    pub fn evaluator(mut self, evaluator: impl ExpressionEvaluator + 'static) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    /// Set the resource loader.
    #[must_use]
    pub fn resources(mut self, resources: impl ResourceLoader + 'static) -> Self {
        self.resources = Some(Box::new(resources));
        self
    }

    /// Set the service locator.
    #[must_use]
    pub fn services(mut self, services: impl ServiceLocator + 'static) -> Self {
        self.services = Some(Box::new(services));
        self
    }

    /// Build the interpreter.
    #[must_use]
    pub fn build(self) -> Interpreter {
        let resources = self
            .resources
            .unwrap_or_else(|| Box::new(ClasspathLoader::from_config(&self.config.resources)));
        Interpreter {
            evaluator: self
                .evaluator
                .unwrap_or_else(|| Box::new(RhaiEvaluator::new())),
            resources,
            services: self.services.unwrap_or_else(|| Box::new(NoServices)),
            config: self.config,
            context: VariableContext::new(),
            globals: ExportedGlobals::new(),
            session_block: None,
            rule_session: None,
        }
    }
}

/// Interprets step text against one scenario's state.
///
/// Owns the variable context, the exported globals, the current session
/// definition and, once attached, the rule session. Handlers receive it by
/// `&mut`; there is no shared global state.
///
/// # Example
///
/// ```
/// use rule_steps::Interpreter;
///
/// let mut interpreter = Interpreter::new();
/// interpreter.interpret_variable_directive(r#"callee is "bob""#, false).unwrap();
/// let text = interpreter.substitute("calling ${callee}").unwrap();
/// assert_eq!(text, "calling bob");
/// ```
pub struct Interpreter {
    config: InterpreterConfig,
    evaluator: Box<dyn ExpressionEvaluator>,
    resources: Box<dyn ResourceLoader>,
    services: Box<dyn ServiceLocator>,
    context: VariableContext,
    globals: ExportedGlobals,
    session_block: Option<SessionDirectiveBlock>,
    rule_session: Option<Box<dyn RuleSession>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("config", &self.config)
            .field("context", &self.context)
            .field("globals", &self.globals)
            .field("session_block", &self.session_block)
            .field("rule_session", &self.rule_session.is_some())
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    /// Create an interpreter with default collaborators and configuration.
    #[must_use]
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    /// Start building an interpreter.
    #[must_use]
    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Replace every placeholder in `text`.
    pub fn substitute(&mut self, text: &str) -> Result<String> {
        text::substitute(text, self.evaluator.as_ref(), &mut self.context)
    }

    /// Evaluate an expression against the variable context.
    pub fn evaluate(&mut self, expression: &str) -> Result<Value> {
        self.evaluator.evaluate(expression, &mut self.context)
    }

    /// Compare two values with the evaluator's notion of equality.
    #[must_use]
    pub fn values_equal(&self, left: &Value, right: &Value) -> bool {
        self.evaluator.values_equal(left, right)
    }

    /// Make a namespace's types resolvable by simple name.
    pub fn import_namespace(&mut self, namespace: &str) {
        let namespace = namespace.trim();
        if !namespace.is_empty() {
            tracing::debug!(namespace, "importing namespace");
            self.context.import_namespace(namespace);
        }
    }

    /// Bind a variable, returning the previous binding.
    pub fn define_variable(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.context.define(name, value)
    }

    /// The current binding of a variable.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.context.get(name)
    }

    /// The variable context.
    #[must_use]
    pub const fn context(&self) -> &VariableContext {
        &self.context
    }

    /// Replace the variable context with an empty one, returning the old one.
    ///
    /// Bindings and imported namespaces are both discarded.
    pub fn reset_context(&mut self) -> VariableContext {
        std::mem::take(&mut self.context)
    }

    /// Drop the session scope: variable context, exported globals and the
    /// current session definition. An attached rule session is kept.
    pub fn reset_scope(&mut self) {
        tracing::debug!("resetting session scope");
        self.reset_context();
        self.globals = ExportedGlobals::new();
        self.session_block = None;
    }

    /// The exported globals.
    #[must_use]
    pub const fn globals(&self) -> &ExportedGlobals {
        &self.globals
    }

    /// The current session definition.
    #[must_use]
    pub const fn session_block(&self) -> Option<&SessionDirectiveBlock> {
        self.session_block.as_ref()
    }

    /// Parse and resolve a variable directive, then bind the result.
    ///
    /// With `global` set, the value is also exported and pushed into the
    /// attached rule session. On failure nothing is bound.
    pub fn interpret_variable_directive(&mut self, sentence: &str, global: bool) -> Result<()> {
        let directive = Directive::parse(sentence)?;
        self.evaluator.validate_name(&directive.name)?;
        let value = Resolver::new(
            self.evaluator.as_ref(),
            &mut self.context,
            self.resources.as_ref(),
            self.services.as_ref(),
        )
        .with_rule_session(self.rule_session.as_deref())
        .resolve(&directive)?;

        if global {
            if let Some(session) = self.rule_session.as_mut() {
                session.set_global(&directive.name, value.clone())?;
            }
            self.globals.insert(directive.name.clone(), value.clone());
        }
        tracing::debug!(name = %directive.name, global, "bound variable");
        self.context.define(directive.name, value);
        Ok(())
    }

    /// Start a new session scope from a session definition block.
    ///
    /// The variable context, the exported globals and the previous
    /// definition are replaced before the new definition is stored.
    pub fn interpret_session_directive(&mut self, block: &str) -> SessionDirectiveBlock {
        self.reset_scope();
        let definition = SessionDirectiveBlock::parse_with(block, &self.config.session);
        self.session_block = Some(definition.clone());
        definition
    }

    /// Parse expected activation counts.
    pub fn interpret_activation_counts(&self, block: &str) -> Result<ActivationCountMap> {
        parse_counts(block)
    }

    /// Attach a rule session, destroying the previous one.
    ///
    /// Every exported global is pushed into the new session.
    pub fn attach_rule_session(&mut self, mut session: Box<dyn RuleSession>) -> Result<()> {
        self.close_rule_session();
        for (name, value) in self.globals.iter() {
            session.set_global(name, value.clone())?;
        }
        self.rule_session = Some(session);
        Ok(())
    }

    /// Destroy the attached rule session, if any.
    pub fn close_rule_session(&mut self) {
        if let Some(mut session) = self.rule_session.take() {
            tracing::debug!("destroying rule session");
            session.destroy();
        }
    }

    /// Whether a rule session is attached.
    #[must_use]
    pub const fn has_rule_session(&self) -> bool {
        self.rule_session.is_some()
    }

    /// The attached rule session.
    pub fn rule_session(&mut self) -> Result<&mut dyn RuleSession> {
        match self.rule_session.as_mut() {
            Some(session) => Ok(session.as_mut()),
            None => Err(StepError::NoRuleSession),
        }
    }
}
