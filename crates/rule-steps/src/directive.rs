//! Variable directives: `<name> is|as [<Type> from] [<marker>] <expression>`.
//!
//! A directive is parsed into a [`Directive`] and then resolved into a value
//! by the [`Resolver`], which dispatches on the directive's [`ContentKind`].

mod parser;
mod resolver;

use std::fmt;

pub use parser::MARKERS;
pub use resolver::Resolver;

/// How the right-hand side of a directive is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// A plain expression for the evaluator.
    Expression,
    /// Inline JSON text.
    Json,
    /// A locator of a JSON resource.
    JsonResource,
    /// Inline YAML text.
    Yaml,
    /// A locator of a YAML resource.
    YamlResource,
    /// A query of the facts in the active rule session.
    SessionQuery,
    /// A lookup in the external service registry.
    ServiceLookup,
}

impl ContentKind {
    /// The marker that selects this kind in step text, if any.
    #[must_use]
    pub fn marker(self) -> Option<&'static str> {
        MARKERS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(marker, _)| *marker)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expression => write!(f, "expression"),
            Self::Json => write!(f, "json"),
            Self::JsonResource => write!(f, "json resource"),
            Self::Yaml => write!(f, "yaml"),
            Self::YamlResource => write!(f, "yaml resource"),
            Self::SessionQuery => write!(f, "the session"),
            Self::ServiceLookup => write!(f, "spring service"),
        }
    }
}

/// A parsed variable directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Variable name to bind.
    pub name: String,
    /// Declared type, as written before ` from `.
    pub declared_type: Option<String>,
    /// How to interpret `expression`.
    pub content_kind: ContentKind,
    /// The right-hand side with the marker stripped.
    pub expression: String,
}

impl Directive {
    /// Parse a directive sentence.
    ///
    /// # Example
    ///
    /// ```
    /// use rule_steps::directive::{ContentKind, Directive};
    ///
    /// let d = Directive::parse("dialing as Dialing from json {\"to\": \"bob\"}").unwrap();
    /// assert_eq!(d.name, "dialing");
    /// assert_eq!(d.declared_type.as_deref(), Some("Dialing"));
    /// assert_eq!(d.content_kind, ContentKind::Json);
    /// assert_eq!(d.expression, "{\"to\": \"bob\"}");
    /// ```
    pub fn parse(sentence: &str) -> crate::Result<Self> {
        parser::parse(sentence)
    }
}
