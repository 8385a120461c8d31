//! In-memory collaborators for tests.
//!
//! [`InMemoryRuleSession`] is a tiny rule engine: each rule is a name and a
//! condition over single facts, and firing activates every rule once per
//! matching fact. That is enough to exercise steps end to end without a real
//! engine.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use crate::counts::ActivationCountMap;
use crate::error::{Result, StepError};
use crate::eval::{TypeHandle, TypeRegistry, Value, render};
use crate::resource::ResourceLoader;
use crate::session::{RuleSession, ScenarioMeta, SessionDirectiveBlock, SessionFactory};

type Condition = Rc<dyn Fn(&Value) -> bool>;

/// A named rule over single facts.
#[derive(Clone)]
struct MockRule {
    name: String,
    condition: Condition,
    retracts: bool,
}

impl std::fmt::Debug for MockRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRule")
            .field("name", &self.name)
            .field("retracts", &self.retracts)
            .finish_non_exhaustive()
    }
}

/// A rule session held entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryRuleSession {
    rules: Vec<MockRule>,
    facts: Vec<Value>,
    retracted: Vec<Value>,
    globals: HashMap<String, Value>,
    fired: HashSet<(usize, usize)>,
    next_fact: usize,
    fact_ids: Vec<usize>,
    activations: Vec<String>,
    checkpoint: usize,
    definition: SessionDirectiveBlock,
    scenario: ScenarioMeta,
    types: TypeRegistry,
    clock: Duration,
    destroyed: bool,
}

impl InMemoryRuleSession {
    /// Create a session without rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule that activates once for every fact matching `condition`.
    #[must_use]
    pub fn rule(mut self, name: &str, condition: impl Fn(&Value) -> bool + 'static) -> Self {
        self.rules.push(MockRule {
            name: name.to_string(),
            condition: Rc::new(condition),
            retracts: false,
        });
        self
    }

    /// Add a rule that retracts each fact it activates on.
    #[must_use]
    pub fn retracting_rule(
        mut self,
        name: &str,
        condition: impl Fn(&Value) -> bool + 'static,
    ) -> Self {
        self.rules.push(MockRule {
            name: name.to_string(),
            condition: Rc::new(condition),
            retracts: true,
        });
        self
    }

    /// Do not track activations of rules matching these patterns.
    #[must_use]
    pub fn ignoring<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scenario.ignore.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Compare facts with the equality of these types.
    #[must_use]
    pub fn types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    /// Facts currently in the session.
    #[must_use]
    pub fn facts(&self) -> &[Value] {
        &self.facts
    }

    /// A session global.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Tracked activations, oldest first.
    #[must_use]
    pub fn activations(&self) -> &[String] {
        &self.activations
    }

    /// Time advanced so far.
    #[must_use]
    pub const fn clock(&self) -> Duration {
        self.clock
    }

    /// Whether [`RuleSession::destroy`] was called.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn is_ignored(&self, rule: &str) -> bool {
        self.scenario.is_ignored(&self.definition, rule)
    }

    fn contains(&self, haystack: &[Value], fact: &Value) -> bool {
        haystack.iter().any(|f| self.types.values_equal(f, fact))
    }

    fn counts(activations: &[String]) -> ActivationCountMap {
        let mut counts = ActivationCountMap::new();
        for rule in activations {
            *counts.entry(rule.clone()).or_default() += 1;
        }
        counts
    }

    fn compare_rules(scope: &str, expected: &[String], actual: &[String]) -> Result<()> {
        let expected: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
        let actual: BTreeSet<&str> = actual.iter().map(String::as_str).collect();
        if expected == actual {
            Ok(())
        } else {
            Err(StepError::assertion(format!(
                "{scope}: expected rules {expected:?}, activated {actual:?}"
            )))
        }
    }

    fn compare_counts(
        scope: &str,
        expected: &ActivationCountMap,
        actual: &ActivationCountMap,
    ) -> Result<()> {
        let mismatched: Vec<String> = expected
            .iter()
            .filter(|(rule, count)| actual.get(*rule).copied().unwrap_or(0) != **count)
            .map(|(rule, count)| {
                format!(
                    "'{rule}' expected {count}, was {}",
                    actual.get(rule).copied().unwrap_or(0)
                )
            })
            .chain(
                actual
                    .keys()
                    .filter(|rule| !expected.contains_key(*rule))
                    .map(|rule| format!("'{rule}' was not expected to be activated")),
            )
            .collect();

        if mismatched.is_empty() {
            Ok(())
        } else {
            Err(StepError::assertion(format!(
                "{scope}: {}",
                mismatched.join("; ")
            )))
        }
    }

    fn tracked(&self, from: usize) -> Vec<String> {
        self.activations[from..]
            .iter()
            .filter(|rule| !self.is_ignored(rule))
            .cloned()
            .collect()
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.destroyed {
            Err(StepError::rule_engine("session has been destroyed"))
        } else {
            Ok(())
        }
    }
}

impl RuleSession for InMemoryRuleSession {
    fn query_one(&self, ty: &TypeHandle) -> Result<Value> {
        let mut matching = self.facts.iter().filter(|f| ty.matches(f));
        match (matching.next(), matching.next()) {
            (Some(fact), None) => Ok(fact.clone()),
            (None, _) => Err(StepError::rule_engine(format!(
                "no fact of type {} in the session",
                ty.name()
            ))),
            (Some(_), Some(_)) => Err(StepError::rule_engine(format!(
                "more than one fact of type {} in the session",
                ty.name()
            ))),
        }
    }

    fn query_all(&self, ty: &TypeHandle) -> Result<Vec<Value>> {
        Ok(self.facts.iter().filter(|f| ty.matches(f)).cloned().collect())
    }

    fn set_global(&mut self, name: &str, value: Value) -> Result<()> {
        self.globals.insert(name.to_string(), value);
        Ok(())
    }

    fn destroy(&mut self) {
        self.destroyed = true;
    }

    fn insert(&mut self, facts: Vec<Value>) -> Result<()> {
        self.ensure_alive()?;
        for fact in facts {
            tracing::debug!(fact = %render(&fact), "inserted");
            self.facts.push(fact);
            self.fact_ids.push(self.next_fact);
            self.next_fact += 1;
        }
        Ok(())
    }

    fn fire_all_rules(&mut self) -> Result<()> {
        self.ensure_alive()?;
        let mut index = 0;
        while index < self.facts.len() {
            let id = self.fact_ids[index];
            let mut retracted = false;
            for (rule_index, rule) in self.rules.iter().enumerate() {
                if self.fired.contains(&(rule_index, id)) || !(rule.condition)(&self.facts[index]) {
                    continue;
                }
                self.fired.insert((rule_index, id));
                self.activations.push(rule.name.clone());
                if rule.retracts {
                    retracted = true;
                    break;
                }
            }
            if retracted {
                let fact = self.facts.remove(index);
                self.fact_ids.remove(index);
                tracing::debug!(fact = %render(&fact), "retracted");
                self.retracted.push(fact);
            } else {
                index += 1;
            }
        }
        Ok(())
    }

    fn advance_time(&mut self, amount: Duration) -> Result<()> {
        self.ensure_alive()?;
        self.clock += amount;
        Ok(())
    }

    fn await_for(&mut self, rules: &[String]) -> Result<()> {
        self.fire_all_rules()?;
        match rules.iter().find(|r| !self.activations.contains(r)) {
            Some(rule) => Err(StepError::assertion(format!("rule '{rule}' never fired"))),
            None => Ok(()),
        }
    }

    fn trigger_all_scheduled_activations(&mut self) -> Result<()> {
        self.fire_all_rules()
    }

    fn print_facts(&self) {
        for fact in &self.facts {
            tracing::info!(fact = %render(fact), "fact");
        }
    }

    fn print_performance_statistic(&self) {
        for (rule, count) in Self::counts(&self.activations) {
            tracing::info!(rule = %rule, activations = count, "rule statistic");
        }
    }

    fn assert_exist(&self, facts: &[Value]) -> Result<()> {
        match facts.iter().find(|f| !self.contains(&self.facts, f)) {
            Some(fact) => Err(StepError::assertion(format!(
                "fact {} does not exist",
                render(fact)
            ))),
            None => Ok(()),
        }
    }

    fn assert_facts_count(&self, count: usize) -> Result<()> {
        if self.facts.len() == count {
            Ok(())
        } else {
            Err(StepError::assertion(format!(
                "expected {count} facts, found {}",
                self.facts.len()
            )))
        }
    }

    fn assert_retracted(&self, facts: &[Value]) -> Result<()> {
        match facts.iter().find(|f| !self.contains(&self.retracted, f)) {
            Some(fact) => Err(StepError::assertion(format!(
                "fact {} was not retracted",
                render(fact)
            ))),
            None => Ok(()),
        }
    }

    fn assert_all_retracted(&self) -> Result<()> {
        self.assert_facts_count(0)
    }

    fn assert_activated(&mut self, rules: &[String]) -> Result<()> {
        let actual = self.tracked(self.checkpoint);
        self.checkpoint = self.activations.len();
        Self::compare_rules("activated since last check", rules, &actual)
    }

    fn assert_activated_counts(&mut self, counts: &ActivationCountMap) -> Result<()> {
        let actual = Self::counts(&self.tracked(self.checkpoint));
        self.checkpoint = self.activations.len();
        Self::compare_counts("activations since last check", counts, &actual)
    }

    fn assert_all_activations(&self, rules: &[String]) -> Result<()> {
        Self::compare_rules("all activations", rules, &self.tracked(0))
    }

    fn assert_all_activation_counts(&self, counts: &ActivationCountMap) -> Result<()> {
        Self::compare_counts("all activations", counts, &Self::counts(&self.tracked(0)))
    }

    fn assert_no_scheduled_activations(&self) -> Result<()> {
        Ok(())
    }
}

/// Creates [`InMemoryRuleSession`]s sharing one rule set.
#[derive(Debug, Default)]
pub struct InMemorySessionFactory {
    template: Vec<MockRule>,
    types: TypeRegistry,
    created: usize,
}

impl InMemorySessionFactory {
    /// Create a factory without rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule to every session created from now on.
    #[must_use]
    pub fn rule(mut self, name: &str, condition: impl Fn(&Value) -> bool + 'static) -> Self {
        self.template.push(MockRule {
            name: name.to_string(),
            condition: Rc::new(condition),
            retracts: false,
        });
        self
    }

    /// Add a retracting rule to every session created from now on.
    #[must_use]
    pub fn retracting_rule(
        mut self,
        name: &str,
        condition: impl Fn(&Value) -> bool + 'static,
    ) -> Self {
        self.template.push(MockRule {
            name: name.to_string(),
            condition: Rc::new(condition),
            retracts: true,
        });
        self
    }

    /// Compare facts in created sessions with the equality of these types.
    #[must_use]
    pub fn types(mut self, types: TypeRegistry) -> Self {
        self.types = types;
        self
    }

    /// Number of sessions created.
    #[must_use]
    pub const fn created(&self) -> usize {
        self.created
    }
}

impl SessionFactory for InMemorySessionFactory {
    fn create(
        &mut self,
        definition: &SessionDirectiveBlock,
        scenario: &ScenarioMeta,
    ) -> Result<Box<dyn RuleSession>> {
        self.created += 1;
        tracing::debug!(
            resources = ?definition.resource_paths,
            ignore = ?scenario.ignore,
            "creating in-memory session"
        );
        let session = InMemoryRuleSession {
            rules: self.template.clone(),
            definition: definition.clone(),
            scenario: scenario.clone(),
            types: self.types.clone(),
            ..InMemoryRuleSession::default()
        };
        Ok(Box::new(session))
    }
}

/// Resources held in memory, keyed by exact locator.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    files: HashMap<String, String>,
}

impl MemoryResources {
    /// Create an empty set of resources.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource.
    #[must_use]
    pub fn with(mut self, locator: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(locator.into(), content.into());
        self
    }
}

impl ResourceLoader for MemoryResources {
    fn load_text(&self, locator: &str) -> Result<String> {
        self.files
            .get(locator)
            .cloned()
            .ok_or_else(|| StepError::ResourceNotFound {
                locator: locator.to_string(),
                searched: Vec::new(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> Value {
        Value::from(n)
    }

    fn names(rules: &[&str]) -> Vec<String> {
        rules.iter().map(ToString::to_string).collect()
    }

    fn session() -> InMemoryRuleSession {
        InMemoryRuleSession::new()
            .rule("positive", |f| f.as_int().is_ok_and(|n| n > 0))
            .retracting_rule("drop negative", |f| f.as_int().is_ok_and(|n| n < 0))
            .rule("audit", |_| true)
    }

    #[test]
    fn firing_activates_once_per_fact() {
        let mut s = session().ignoring(["audit"]);
        s.insert(vec![int(1), int(2)]).unwrap();
        s.fire_all_rules().unwrap();
        s.fire_all_rules().unwrap();
        s.assert_all_activation_counts(&ActivationCountMap::from([("positive".to_string(), 2)]))
            .unwrap();
    }

    #[test]
    fn retracting_rule_removes_fact() {
        let mut s = session();
        s.insert(vec![int(-1), int(3)]).unwrap();
        s.fire_all_rules().unwrap();
        s.assert_retracted(&[int(-1)]).unwrap();
        s.assert_exist(&[int(3)]).unwrap();
        s.assert_facts_count(1).unwrap();
        assert!(s.assert_all_retracted().is_err());
    }

    #[test]
    fn activated_since_last_check() {
        let mut s = session().ignoring(["aud*"]);
        s.insert(vec![int(1)]).unwrap();
        s.fire_all_rules().unwrap();
        s.assert_activated(&names(&["positive"])).unwrap();
        s.assert_activated(&[]).unwrap();

        s.insert(vec![int(-2)]).unwrap();
        s.fire_all_rules().unwrap();
        assert!(s.assert_activated(&names(&["positive"])).is_err());
        s.assert_all_activations(&names(&["positive", "drop negative"]))
            .unwrap();
    }

    #[test]
    fn counts_report_unexpected_rules() {
        let mut s = session();
        s.insert(vec![int(1)]).unwrap();
        s.fire_all_rules().unwrap();
        let err = s
            .assert_activated_counts(&ActivationCountMap::from([("positive".to_string(), 1)]))
            .unwrap_err();
        assert!(err.to_string().contains("'audit' was not expected"));
    }

    #[test]
    fn query_one_requires_exactly_one() {
        let mut s = InMemoryRuleSession::new();
        let ty = TypeHandle::of::<i64>("Long");
        assert!(s.query_one(&ty).is_err());
        s.insert(vec![int(1)]).unwrap();
        assert_eq!(s.query_one(&ty).unwrap().as_int(), Ok(1));
        s.insert(vec![int(2)]).unwrap();
        assert!(s.query_one(&ty).is_err());
        assert_eq!(s.query_all(&ty).unwrap().len(), 2);
    }

    #[test]
    fn await_for_fires() {
        let mut s = session();
        s.insert(vec![int(5)]).unwrap();
        s.await_for(&names(&["positive"])).unwrap();
        assert!(s.await_for(&names(&["never"])).is_err());
    }

    #[test]
    fn destroyed_session_rejects_work() {
        let mut s = InMemoryRuleSession::new();
        s.destroy();
        assert!(s.is_destroyed());
        assert!(s.insert(vec![int(1)]).is_err());
    }

    #[test]
    fn factory_applies_ignore_lists() {
        let mut factory = InMemorySessionFactory::new().rule("audit", |_| true);
        let definition = SessionDirectiveBlock::parse("ignore rules: 'audit'");
        let mut s = factory.create(&definition, &ScenarioMeta::default()).unwrap();
        s.insert(vec![int(1)]).unwrap();
        s.fire_all_rules().unwrap();
        s.assert_all_activations(&[]).unwrap();
        assert_eq!(factory.created(), 1);

        let scenario = ScenarioMeta::parse(", ignore 'aud*'");
        let mut s = factory
            .create(&SessionDirectiveBlock::default(), &scenario)
            .unwrap();
        s.insert(vec![int(1)]).unwrap();
        s.fire_all_rules().unwrap();
        s.assert_all_activations(&[]).unwrap();
    }

    #[derive(Debug, Clone, PartialEq, serde::Deserialize)]
    struct Reading {
        sensor: String,
        level: i64,
    }

    fn reading(sensor: &str, level: i64) -> Value {
        Value::from(Reading {
            sensor: sensor.to_string(),
            level,
        })
    }

    #[test]
    fn registered_facts_compare_by_value() {
        let mut types = TypeRegistry::new();
        types.register(TypeHandle::of::<Reading>("Reading"));
        let mut factory = InMemorySessionFactory::new()
            .retracting_rule("drop low", |f| f.read_lock::<Reading>().is_some_and(|r| r.level < 0))
            .types(types);
        let mut s = factory
            .create(&SessionDirectiveBlock::default(), &ScenarioMeta::default())
            .unwrap();
        s.insert(vec![reading("a", 1), reading("b", -1)]).unwrap();
        s.fire_all_rules().unwrap();

        s.assert_exist(&[reading("a", 1)]).unwrap();
        assert!(s.assert_exist(&[reading("a", 2)]).is_err());
        s.assert_retracted(&[reading("b", -1)]).unwrap();
        assert!(s.assert_retracted(&[reading("a", 1)]).is_err());
    }

    #[test]
    fn unregistered_facts_are_never_found() {
        let mut s = InMemoryRuleSession::new();
        s.insert(vec![reading("a", 1)]).unwrap();
        assert!(s.assert_exist(&[reading("a", 1)]).is_err());
    }

    #[test]
    fn memory_resources() {
        let resources = MemoryResources::new().with("a", "text");
        assert_eq!(resources.load_text("a").unwrap(), "text");
        assert!(matches!(
            resources.load_text("b"),
            Err(StepError::ResourceNotFound { .. })
        ));
    }
}
