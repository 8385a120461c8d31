//! The step vocabulary of a rule-engine scenario.
//!
//! [`ScenarioSteps`] binds step sentences to the [`Interpreter`] and the rule
//! session it creates through a [`SessionFactory`]. Each method handles one
//! sentence shape; [`ScenarioSteps::execute`] dispatches a whole sentence.
//!
//! ```text
//! Given import org.phone
//! Given drools session classpath:/org/phone/rules.drl
//! Given new session for scenario
//! Given variable dial as Dialing from yaml resource classpath:/dialing.yaml
//! When insert and fire dial
//! Then count of activated are 'input call' - 1
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, StepError};
use crate::eval::{Value, render};
use crate::session::{
    Interpreter, RuleSession, ScenarioMeta, SessionDirectiveBlock, SessionFactory, parse_duration,
};
use crate::text::{split_expressions, split_lines, split_strings};

static ASSERT_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<message>.*?)\s*statement\s+(?P<expression>.+)$")
        .expect("assert statement pattern is a valid regex")
});

static ASSERT_EQUALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<actual>.+?)\s+(?:equals?|is)\s+(?P<expected>.+)$")
        .expect("assert equals pattern is a valid regex")
});

const STEP_KEYWORDS: &[&str] = &["Given ", "When ", "Then ", "And "];

const NO_RULES: &str = "no rules";
const ALL_FACTS: &str = "all facts";

/// Step handlers for one scenario run.
pub struct ScenarioSteps<F: SessionFactory> {
    interpreter: Interpreter,
    factory: F,
    pending_imports: Vec<String>,
}

impl<F: SessionFactory> std::fmt::Debug for ScenarioSteps<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioSteps")
            .field("interpreter", &self.interpreter)
            .field("pending_imports", &self.pending_imports)
            .finish_non_exhaustive()
    }
}

impl<F: SessionFactory> ScenarioSteps<F> {
    /// Create steps over an interpreter and a session factory.
    pub const fn new(interpreter: Interpreter, factory: F) -> Self {
        Self {
            interpreter,
            factory,
            pending_imports: Vec::new(),
        }
    }

    /// The interpreter.
    #[must_use]
    pub const fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// The interpreter, mutably.
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// The session factory.
    #[must_use]
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// Run one step sentence, with or without its `Given`/`When`/`Then`/`And`.
    pub fn execute(&mut self, step: &str) -> Result<()> {
        let step = step.trim_start();
        let step = STEP_KEYWORDS
            .iter()
            .find_map(|keyword| step.strip_prefix(keyword))
            .unwrap_or(step)
            .trim_end();
        tracing::debug!(step, "executing step");

        if let Some(rest) = strip_any(step, &["imports", "import"]) {
            self.imports(rest);
        } else if let Some(rest) = strip_any(step, &["drools session", "rule session"]) {
            self.session_definition(rest);
        } else if let Some(rest) = step.strip_prefix("new session for scenario") {
            self.new_session_for_scenario(rest)?;
        } else if let Some(rest) = step.strip_prefix("global ") {
            self.global(rest)?;
        } else if let Some(rest) = step.strip_prefix("variable ") {
            self.variable(rest)?;
        } else if step == "facts printed" {
            self.facts_printed()?;
        } else if step == "performance statistic printed" {
            self.performance_statistic_printed()?;
        } else if let Some(rest) = step.strip_prefix("insert and fire ") {
            self.insert_and_fire(rest)?;
        } else if let Some(rest) = strip_any(step, &["insert facts", "insert fact"]) {
            self.insert_facts(rest)?;
        } else if step == "fire all rules" {
            self.fire_all_rules()?;
        } else if let Some(rest) = step.strip_prefix("advance time for ") {
            self.advance_time(rest)?;
        } else if let Some(rest) = step.strip_prefix("await for ") {
            self.await_for(rest)?;
        } else if let Some(rest) = step.strip_prefix("exist ") {
            self.exist(rest)?;
        } else if let Some(rest) = step.strip_prefix("count of facts is ") {
            let count = rest
                .trim()
                .parse::<usize>()
                .map_err(|_| StepError::malformed("invalid fact count", rest))?;
            self.count_of_facts(count)?;
        } else if let Some(rest) = step.strip_prefix("retracted ") {
            self.retracted(rest)?;
        } else if let Some(rest) = step.strip_prefix("activated ") {
            self.activated(rest)?;
        } else if let Some(rest) = step.strip_prefix("all activations and scheduled are") {
            self.all_activations_and_scheduled(rest)?;
        } else if let Some(rest) = step.strip_prefix("all activations are") {
            self.all_activations(rest)?;
        } else if let Some(rest) = step.strip_prefix("count of activated are") {
            self.count_of_activated(rest)?;
        } else if let Some(rest) = step.strip_prefix("count of all activations and scheduled are") {
            self.count_of_all_activations_and_scheduled(rest)?;
        } else if let Some(rest) = step.strip_prefix("count of all activations are") {
            self.count_of_all_activations(rest)?;
        } else if step == "there are no scheduled activations" {
            self.no_scheduled_activations()?;
        } else if let Some(rest) = step.strip_prefix("assert ") {
            self.assert(rest)?;
        } else {
            return Err(StepError::malformed("unknown step", step));
        }
        Ok(())
    }

    /// `import <namespace>` / `imports` with one namespace per line.
    ///
    /// The first import after a session definition starts a fresh scope.
    /// Imports are carried into the next session definition.
    pub fn imports(&mut self, imports: &str) {
        if self.interpreter.session_block().is_some() {
            self.interpreter.reset_scope();
            self.pending_imports.clear();
        }
        for namespace in split_lines(imports) {
            self.interpreter.import_namespace(&namespace);
            self.pending_imports.push(namespace);
        }
    }

    /// `drools session <definition>`.
    pub fn session_definition(&mut self, block: &str) -> SessionDirectiveBlock {
        let definition = self.interpreter.interpret_session_directive(block);
        for namespace in std::mem::take(&mut self.pending_imports) {
            self.interpreter.import_namespace(&namespace);
        }
        definition
    }

    /// `new session for scenario[, ignore '<rule>', ...]`.
    ///
    /// Destroys the previous rule session and creates a new one from the
    /// current definition, pushing every exported global into it.
    pub fn new_session_for_scenario(&mut self, meta: &str) -> Result<()> {
        let scenario = ScenarioMeta::parse(meta);
        let definition = self
            .interpreter
            .session_block()
            .cloned()
            .unwrap_or_else(|| SessionDirectiveBlock::parse_with("", &self.interpreter.config().session));

        self.interpreter.close_rule_session();
        let session = self.factory.create(&definition, &scenario)?;
        self.interpreter.attach_rule_session(session)
    }

    /// `global <directive>`.
    pub fn global(&mut self, directive: &str) -> Result<()> {
        self.interpreter.interpret_variable_directive(directive, true)
    }

    /// `variable <directive>`.
    pub fn variable(&mut self, directive: &str) -> Result<()> {
        self.interpreter.interpret_variable_directive(directive, false)
    }

    /// `facts printed`.
    pub fn facts_printed(&mut self) -> Result<()> {
        self.session()?.print_facts();
        Ok(())
    }

    /// `performance statistic printed`.
    pub fn performance_statistic_printed(&mut self) -> Result<()> {
        self.session()?.print_performance_statistic();
        Ok(())
    }

    /// `insert and fire <expressions>`.
    pub fn insert_and_fire(&mut self, expressions: &str) -> Result<()> {
        let facts = self.evaluate_all(expressions)?;
        let session = self.session()?;
        session.insert(facts)?;
        session.fire_all_rules()
    }

    /// `insert facts <expressions>`.
    pub fn insert_facts(&mut self, expressions: &str) -> Result<()> {
        let facts = self.evaluate_all(expressions)?;
        self.session()?.insert(facts)
    }

    /// `fire all rules`.
    pub fn fire_all_rules(&mut self) -> Result<()> {
        self.session()?.fire_all_rules()
    }

    /// `advance time for <amount> <unit>`.
    pub fn advance_time(&mut self, amount: &str) -> Result<()> {
        let duration = parse_duration(amount)?;
        self.session()?.advance_time(duration)
    }

    /// `await for <rules>`.
    pub fn await_for(&mut self, rules: &str) -> Result<()> {
        self.session()?.await_for(&split_strings(rules))
    }

    /// `exist <expressions>`.
    pub fn exist(&mut self, expressions: &str) -> Result<()> {
        let facts = self.evaluate_all(expressions)?;
        self.session()?.assert_exist(&facts)
    }

    /// `count of facts is <count>`.
    pub fn count_of_facts(&mut self, count: usize) -> Result<()> {
        self.session()?.assert_facts_count(count)
    }

    /// `retracted <expressions>` or `retracted all facts`.
    pub fn retracted(&mut self, expressions: &str) -> Result<()> {
        if expressions.trim() == ALL_FACTS {
            return self.session()?.assert_all_retracted();
        }
        let facts = self.evaluate_all(expressions)?;
        self.session()?.assert_retracted(&facts)
    }

    /// `activated <rules>` or `activated no rules`.
    pub fn activated(&mut self, rules: &str) -> Result<()> {
        let rules = if rules.trim() == NO_RULES {
            Vec::new()
        } else {
            split_strings(rules)
        };
        self.session()?.assert_activated(&rules)
    }

    /// `all activations are <rules>`.
    pub fn all_activations(&mut self, rules: &str) -> Result<()> {
        self.session()?.assert_all_activations(&split_strings(rules))
    }

    /// `all activations and scheduled are <rules>`.
    pub fn all_activations_and_scheduled(&mut self, rules: &str) -> Result<()> {
        let session = self.session()?;
        session.trigger_all_scheduled_activations()?;
        session.assert_all_activations(&split_strings(rules))
    }

    /// `count of activated are <counts>`.
    pub fn count_of_activated(&mut self, counts: &str) -> Result<()> {
        let counts = self.interpreter.interpret_activation_counts(counts)?;
        self.session()?.assert_activated_counts(&counts)
    }

    /// `count of all activations are <counts>`.
    pub fn count_of_all_activations(&mut self, counts: &str) -> Result<()> {
        let counts = self.interpreter.interpret_activation_counts(counts)?;
        self.session()?.assert_all_activation_counts(&counts)
    }

    /// `count of all activations and scheduled are <counts>`.
    pub fn count_of_all_activations_and_scheduled(&mut self, counts: &str) -> Result<()> {
        let counts = self.interpreter.interpret_activation_counts(counts)?;
        let session = self.session()?;
        session.trigger_all_scheduled_activations()?;
        session.assert_all_activation_counts(&counts)
    }

    /// `there are no scheduled activations`.
    pub fn no_scheduled_activations(&mut self) -> Result<()> {
        self.session()?.assert_no_scheduled_activations()
    }

    /// `assert <message> statement <expression>` or
    /// `assert <actual> equals|equal|is <expected>`.
    pub fn assert(&mut self, text: &str) -> Result<()> {
        if let Some(caps) = ASSERT_STATEMENT.captures(text) {
            return self.assert_statement(&caps["message"], &caps["expression"]);
        }
        match ASSERT_EQUALS.captures(text) {
            Some(caps) => self.assert_equals(&caps["actual"], &caps["expected"]),
            None => Err(StepError::malformed(
                "expected 'assert <message> statement <expression>' or 'assert <a> equals <b>'",
                text,
            )),
        }
    }

    /// Assert that a boolean expression holds.
    pub fn assert_statement(&mut self, message: &str, expression: &str) -> Result<()> {
        let value = self.interpreter.evaluate(expression)?;
        let holds = value.as_bool().map_err(|type_name| {
            StepError::assertion(format!(
                "statement {expression} evaluated to {type_name}, not a boolean"
            ))
        })?;
        if holds {
            return Ok(());
        }
        let message = message.trim();
        Err(StepError::assertion(if message.is_empty() {
            format!("statement {expression} is false")
        } else {
            message.to_string()
        }))
    }

    /// Assert that two expressions evaluate to equal values.
    pub fn assert_equals(&mut self, actual: &str, expected: &str) -> Result<()> {
        let expected_value = self.interpreter.evaluate(expected)?;
        let actual_value = self.interpreter.evaluate(actual)?;
        if self.interpreter.values_equal(&actual_value, &expected_value) {
            Ok(())
        } else {
            Err(StepError::assertion(format!(
                "expected {actual} to be <{}> but was <{}>",
                render(&expected_value),
                render(&actual_value)
            )))
        }
    }

    fn session(&mut self) -> Result<&mut dyn RuleSession> {
        self.interpreter.rule_session()
    }

    fn evaluate_all(&mut self, expressions: &str) -> Result<Vec<Value>> {
        split_expressions(expressions)
            .iter()
            .map(|expression| self.interpreter.evaluate(expression))
            .collect()
    }
}

/// Strip the first keyword that is followed by whitespace or the end of text.
fn strip_any<'a>(text: &'a str, keywords: &[&str]) -> Option<&'a str> {
    keywords.iter().find_map(|keyword| {
        text.strip_prefix(keyword)
            .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}
