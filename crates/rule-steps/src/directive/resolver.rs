//! Turns a parsed directive into a value.

use super::{ContentKind, Directive};
use crate::error::{Result, StepError};
use crate::eval::{ExpressionEvaluator, TypeHandle, Value, VariableContext};
use crate::resource::ResourceLoader;
use crate::service::ServiceLocator;
use crate::session::RuleSession;
use crate::text::substitute;

/// Type used for JSON/YAML content that declares none.
const UNTYPED: &str = "Object";

/// Dispatches a directive to the strategy for its content kind.
///
/// The resolver borrows its collaborators for the duration of one
/// resolution. It never binds the result; that is left to the caller so a
/// failed resolution leaves the context without the new name.
pub struct Resolver<'a> {
    evaluator: &'a dyn ExpressionEvaluator,
    context: &'a mut VariableContext,
    resources: &'a dyn ResourceLoader,
    services: &'a dyn ServiceLocator,
    rule_session: Option<&'a dyn RuleSession>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver without a rule session.
    pub fn new(
        evaluator: &'a dyn ExpressionEvaluator,
        context: &'a mut VariableContext,
        resources: &'a dyn ResourceLoader,
        services: &'a dyn ServiceLocator,
    ) -> Self {
        Self {
            evaluator,
            context,
            resources,
            services,
            rule_session: None,
        }
    }

    /// Make a rule session available to session queries.
    #[must_use]
    pub fn with_rule_session(mut self, rule_session: Option<&'a dyn RuleSession>) -> Self {
        self.rule_session = rule_session;
        self
    }

    /// Resolve a directive into a value.
    ///
    /// Any failure is reported as [`StepError::ResolutionFailure`] carrying
    /// the directive's kind, declared type and expression.
    pub fn resolve(&mut self, directive: &Directive) -> Result<Value> {
        tracing::debug!(
            name = %directive.name,
            kind = %directive.content_kind,
            "resolving directive"
        );
        self.dispatch(directive).map_err(|source| {
            StepError::resolution(
                directive.content_kind,
                directive.declared_type.as_deref(),
                directive.expression.as_str(),
                source,
            )
        })
    }

    fn dispatch(&mut self, directive: &Directive) -> Result<Value> {
        let expression = directive.expression.as_str();
        match directive.content_kind {
            ContentKind::Expression => self.evaluator.evaluate(expression, self.context),
            ContentKind::Json => {
                let text = self.substitute(expression)?;
                self.declared_type(directive)?.from_json(&text)
            }
            ContentKind::Yaml => {
                let text = self.substitute(expression)?;
                self.declared_type(directive)?.from_yaml(&text)
            }
            ContentKind::JsonResource => {
                let text = self.load(expression)?;
                self.declared_type(directive)?.from_json(&text)
            }
            ContentKind::YamlResource => {
                let text = self.load(expression)?;
                self.declared_type(directive)?.from_yaml(&text)
            }
            ContentKind::SessionQuery => self.query_session(directive),
            ContentKind::ServiceLookup => {
                let key = self.substitute(expression)?;
                self.services.lookup(key.trim())
            }
        }
    }

    fn substitute(&mut self, text: &str) -> Result<String> {
        substitute(text, self.evaluator, self.context)
    }

    fn load(&mut self, locator: &str) -> Result<String> {
        let locator = self.substitute(locator)?;
        self.resources.load_text(locator.trim())
    }

    fn declared_type(&self, directive: &Directive) -> Result<TypeHandle> {
        match directive.declared_type.as_deref() {
            Some(name) => self.evaluator.resolve_type(name, &*self.context),
            None => Ok(TypeHandle::dynamic(UNTYPED)),
        }
    }

    /// `<Type> object` yields the single fact, `<Type> objects` all of them.
    fn query_session(&self, directive: &Directive) -> Result<Value> {
        let declared = directive.declared_type.as_deref().unwrap_or_default();
        let invalid = || StepError::InvalidSessionQuery {
            declared_type: declared.to_string(),
        };

        let mut words = declared.split_whitespace();
        let (Some(type_name), Some(quantifier), None) = (words.next(), words.next(), words.next())
        else {
            return Err(invalid());
        };
        let many = match quantifier {
            "object" => false,
            "objects" => true,
            _ => return Err(invalid()),
        };

        let session = self.rule_session.ok_or(StepError::NoRuleSession)?;
        let ty = self.evaluator.resolve_type(type_name, &*self.context)?;
        if many {
            Ok(Value::from_array(session.query_all(&ty)?))
        } else {
            session.query_one(&ty)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::eval::RhaiEvaluator;
    use crate::mock::{InMemoryRuleSession, MemoryResources};
    use crate::service::{NoServices, ServiceRegistry};

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Dialing {
        from: String,
        to: String,
    }

    fn evaluator() -> RhaiEvaluator {
        RhaiEvaluator::new().with_type::<Dialing>("org.phone.Dialing")
    }

    fn resolve_with(
        sentence: &str,
        ctx: &mut VariableContext,
        resources: &MemoryResources,
        session: Option<&dyn RuleSession>,
    ) -> Result<Value> {
        let evaluator = evaluator();
        let directive = Directive::parse(sentence)?;
        Resolver::new(&evaluator, ctx, resources, &NoServices)
            .with_rule_session(session)
            .resolve(&directive)
    }

    fn resolve(sentence: &str, ctx: &mut VariableContext) -> Result<Value> {
        resolve_with(sentence, ctx, &MemoryResources::new(), None)
    }

    #[test]
    fn expression() {
        let mut ctx = VariableContext::new();
        assert_eq!(resolve("x is 40 + 2", &mut ctx).unwrap().as_int(), Ok(42));
    }

    #[test]
    fn typed_json_with_placeholders() {
        let mut ctx = VariableContext::new();
        ctx.import_namespace("org.phone");
        ctx.define("callee", Value::from("bob".to_string()));
        let value = resolve(
            r#"dial as Dialing from json {"from": "alice", "to": "${callee}"}"#,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(
            value.cast::<Dialing>(),
            Dialing {
                from: "alice".into(),
                to: "bob".into()
            }
        );
    }

    #[test]
    fn untyped_yaml_is_map() {
        let mut ctx = VariableContext::new();
        let value = resolve("cfg is yaml\na: 1\nb: two", &mut ctx).unwrap();
        let map = value.cast::<rhai::Map>();
        assert_eq!(map["a"].as_int(), Ok(1));
    }

    #[test]
    fn yaml_resource_with_substituted_locator() {
        let resources = MemoryResources::new()
            .with("classpath:/dialing-bob.yaml", "from: alice\nto: bob\n");
        let mut ctx = VariableContext::new();
        ctx.import_namespace("org.phone");
        ctx.define("who", Value::from("bob".to_string()));
        let value = resolve_with(
            "dial as Dialing from yaml resource classpath:/dialing-${who}.yaml",
            &mut ctx,
            &resources,
            None,
        )
        .unwrap();
        assert_eq!(value.cast::<Dialing>().to, "bob");
    }

    #[test]
    fn resource_content_is_not_substituted() {
        let resources = MemoryResources::new().with("a.json", r#"{"text": "${nope}"}"#);
        let mut ctx = VariableContext::new();
        let value = resolve_with("a is json resource a.json", &mut ctx, &resources, None).unwrap();
        let map = value.cast::<rhai::Map>();
        assert_eq!(map["text"].clone().into_string().unwrap(), "${nope}");
    }

    #[test]
    fn session_query_single_and_many() {
        let mut session = InMemoryRuleSession::new();
        session
            .insert(vec![
                Value::from(Dialing {
                    from: "a".into(),
                    to: "b".into(),
                }),
                Value::from(7_i64),
            ])
            .unwrap();

        let mut ctx = VariableContext::new();
        ctx.import_namespace("org.phone");
        let one = resolve_with(
            "d as Dialing object from the session",
            &mut ctx,
            &MemoryResources::new(),
            Some(&session),
        )
        .unwrap();
        assert_eq!(one.cast::<Dialing>().to, "b");

        let many = resolve_with(
            "all as Dialing objects from the session",
            &mut ctx,
            &MemoryResources::new(),
            Some(&session),
        )
        .unwrap();
        assert_eq!(many.cast::<rhai::Array>().len(), 1);
    }

    #[test]
    fn session_query_needs_quantifier() {
        let session = InMemoryRuleSession::new();
        let mut ctx = VariableContext::new();
        let err = resolve_with(
            "d as Dialing from the session",
            &mut ctx,
            &MemoryResources::new(),
            Some(&session),
        )
        .unwrap_err();
        assert!(matches!(err.root(), StepError::InvalidSessionQuery { .. }));
    }

    #[test]
    fn session_query_without_session() {
        let mut ctx = VariableContext::new();
        let err = resolve("d as Dialing object from the session", &mut ctx).unwrap_err();
        assert!(matches!(err.root(), StepError::NoRuleSession));
    }

    #[test]
    fn service_lookup_defaults_to_unsupported() {
        let mut ctx = VariableContext::new();
        let err = resolve("rest is a spring service restTemplate", &mut ctx).unwrap_err();
        assert!(err.is_unsupported());
        assert!(matches!(
            err,
            StepError::ResolutionFailure {
                kind: ContentKind::ServiceLookup,
                ..
            }
        ));
    }

    #[test]
    fn service_lookup_key_is_substituted() {
        let evaluator = evaluator();
        let services = ServiceRegistry::new().with_service("clock-1", Value::from(1_i64));
        let mut ctx = VariableContext::new();
        ctx.define("n", Value::from(1_i64));
        let directive = Directive::parse("c is a spring service clock-${n}").unwrap();
        let value = Resolver::new(&evaluator, &mut ctx, &MemoryResources::new(), &services)
            .resolve(&directive)
            .unwrap();
        assert_eq!(value.as_int(), Ok(1));
    }

    #[test]
    fn unknown_type_is_wrapped() {
        let mut ctx = VariableContext::new();
        let err = resolve("x as Nope from json {}", &mut ctx).unwrap_err();
        assert!(matches!(err.root(), StepError::UnknownType { .. }));
        assert!(err.to_string().contains("cannot resolve variable Nope from json"));
    }

    #[test]
    fn invalid_json_is_wrapped() {
        let mut ctx = VariableContext::new();
        let err = resolve("x is json {not json", &mut ctx).unwrap_err();
        assert!(matches!(err.root(), StepError::Json(_)));
    }
}
