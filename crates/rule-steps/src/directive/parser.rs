//! Sentence grammar for variable directives.

use std::sync::LazyLock;

use regex::Regex;

use super::{ContentKind, Directive};
use crate::error::{Result, StepError};

/// Content markers in matching order; longer markers precede their prefixes.
pub const MARKERS: &[(&str, ContentKind)] = &[
    ("json resource", ContentKind::JsonResource),
    ("json", ContentKind::Json),
    ("yaml resource", ContentKind::YamlResource),
    ("yaml", ContentKind::Yaml),
    ("the session", ContentKind::SessionQuery),
    ("spring service", ContentKind::ServiceLookup),
];

/// The connective between variable name and the rest of the sentence.
static CONNECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+(?:(?P<verb>is|as)|equals?(?:\s+to)?)\s+")
        .expect("connective pattern is a valid regex")
});

/// Article allowed after `is`/`as`.
static ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^an?\s+").expect("article pattern is a valid regex"));

/// `equal(s)` / `equal(s) to` allowed after `is`/`as` and the article.
static EQUALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^equals?(?:\s+to)?\s+").expect("equals pattern is a valid regex")
});

const TYPE_SEPARATOR: &str = " from ";

/// Whether `text` starts a new operand rather than continuing an expression.
///
/// `a + 1` keeps `a` as a variable; `a 5` or `a Dialing from` drop it as an article.
fn starts_operand(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '"' | '\'' | '`' | '#' | '{'))
}

/// Strip a filler word matched by `filler` when an operand follows it.
fn strip_filler<'a>(text: &'a str, filler: &Regex) -> &'a str {
    match filler.find(text) {
        Some(m) if starts_operand(&text[m.end()..]) => &text[m.end()..],
        _ => text,
    }
}

/// Split off a known marker, which must be followed by whitespace or the end.
fn strip_marker(rest: &str) -> (ContentKind, &str) {
    for (marker, kind) in MARKERS {
        if let Some(after) = rest.strip_prefix(marker) {
            if after.is_empty() || after.starts_with(char::is_whitespace) {
                return (*kind, after.trim());
            }
        }
    }
    (ContentKind::Expression, rest.trim())
}

pub(super) fn parse(sentence: &str) -> Result<Directive> {
    let caps = CONNECTIVE.captures(sentence).ok_or_else(|| {
        StepError::malformed("expected '<name> is <expression>' or '<name> as ...'", sentence)
    })?;
    let connective = caps.get(0).map_or(0..0, |m| m.range());

    let name = sentence[..connective.start].trim();
    if name.is_empty() {
        return Err(StepError::malformed("missing variable name", sentence));
    }
    if name.contains(char::is_whitespace) {
        return Err(StepError::malformed("variable name must be a single word", sentence));
    }

    let mut rest = &sentence[connective.end..];
    if caps.name("verb").is_some() {
        rest = strip_filler(strip_filler(rest, &ARTICLE), &EQUALS);
    }
    let first_line = rest.lines().next().unwrap_or_default();
    let (declared_type, rest) = if first_line.contains(TYPE_SEPARATOR) {
        match rest.split_once(TYPE_SEPARATOR) {
            Some((ty, rest)) => (Some(ty.trim().to_string()), rest),
            None => (None, rest),
        }
    } else {
        (None, rest)
    };

    if declared_type.as_deref() == Some("") {
        return Err(StepError::malformed("missing type before 'from'", sentence));
    }

    let (content_kind, expression) = strip_marker(rest.trim_start());
    if expression.is_empty() && content_kind != ContentKind::SessionQuery {
        return Err(StepError::malformed("missing expression", sentence));
    }

    let directive = Directive {
        name: name.to_string(),
        declared_type,
        content_kind,
        expression: expression.to_string(),
    };
    tracing::debug!(
        name = %directive.name,
        declared_type = ?directive.declared_type,
        kind = %directive.content_kind,
        "parsed directive"
    );
    Ok(directive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(sentence: &str) -> Directive {
        parse(sentence).unwrap()
    }

    #[test]
    fn plain_expression() {
        let d = parsed("x is 1 + 2");
        assert_eq!(d.name, "x");
        assert_eq!(d.declared_type, None);
        assert_eq!(d.content_kind, ContentKind::Expression);
        assert_eq!(d.expression, "1 + 2");
    }

    #[test]
    fn connective_variants() {
        for sentence in [
            "x is 5",
            "x is a 5",
            "x is an 5",
            "x is equal to 5",
            "x equals 5",
            "x equal to 5",
            "x as 5",
            "x as an equal 5",
        ] {
            let d = parsed(sentence);
            assert_eq!(d.name, "x", "{sentence}");
            assert_eq!(d.expression, "5", "{sentence}");
        }
    }

    #[test]
    fn variable_named_like_an_article_is_kept() {
        assert_eq!(parsed("b is a + 1").expression, "a + 1");
        assert_eq!(parsed("b is an * 2").expression, "an * 2");
        assert_eq!(parsed("b is a").expression, "a");
        assert_eq!(parsed("b as a.len()").expression, "a.len()");
    }

    #[test]
    fn article_before_type_or_marker_is_dropped() {
        let d = parsed("d is a Dialing from json {}");
        assert_eq!(d.declared_type.as_deref(), Some("Dialing"));
        assert_eq!(parsed("d is an yaml k: v").content_kind, ContentKind::Yaml);
    }

    #[test]
    fn equals_word_is_kept_before_operator() {
        assert_eq!(parsed("b is equal + 1").expression, "equal + 1");
    }

    #[test]
    fn article_is_not_eaten_from_word() {
        assert_eq!(parsed("x is apple").expression, "apple");
        assert_eq!(parsed("x is another").expression, "another");
    }

    #[test]
    fn typed_json() {
        let d = parsed("dialing as Dialing from json {\"from\": \"a\"}");
        assert_eq!(d.declared_type.as_deref(), Some("Dialing"));
        assert_eq!(d.content_kind, ContentKind::Json);
        assert_eq!(d.expression, "{\"from\": \"a\"}");
    }

    #[test]
    fn json_resource_wins_over_json() {
        let d = parsed("dialing as Dialing from json resource classpath:/dialing.json");
        assert_eq!(d.content_kind, ContentKind::JsonResource);
        assert_eq!(d.expression, "classpath:/dialing.json");
    }

    #[test]
    fn yaml_forms() {
        assert_eq!(
            parsed("d as Dialing from yaml resource classpath:/d.yaml").content_kind,
            ContentKind::YamlResource
        );
        let d = parsed("d as Dialing from yaml\nfrom: alice\nto: bob");
        assert_eq!(d.content_kind, ContentKind::Yaml);
        assert_eq!(d.expression, "from: alice\nto: bob");
    }

    #[test]
    fn session_query_has_empty_expression() {
        let d = parsed("call as CallInProgress object from the session");
        assert_eq!(d.declared_type.as_deref(), Some("CallInProgress object"));
        assert_eq!(d.content_kind, ContentKind::SessionQuery);
        assert_eq!(d.expression, "");
    }

    #[test]
    fn service_lookup_without_type() {
        let d = parsed("rest is a spring service restTemplate");
        assert_eq!(d.declared_type, None);
        assert_eq!(d.content_kind, ContentKind::ServiceLookup);
        assert_eq!(d.expression, "restTemplate");
    }

    #[test]
    fn marker_requires_word_boundary() {
        let d = parsed("x is jsonValue");
        assert_eq!(d.content_kind, ContentKind::Expression);
        assert_eq!(d.expression, "jsonValue");
    }

    #[test]
    fn from_only_counts_on_first_line() {
        let d = parsed("x is json {\n  \"note\": \"text from elsewhere\"\n}");
        assert_eq!(d.declared_type, None);
        assert_eq!(d.content_kind, ContentKind::Json);
    }

    #[test]
    fn missing_connective_is_malformed() {
        let err = parse("just some words").unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(err.text(), Some("just some words"));
    }

    #[test]
    fn empty_expression_is_malformed() {
        assert!(parse("x is json ").unwrap_err().is_malformed());
        assert!(parse(" is 5").unwrap_err().is_malformed());
    }

    #[test]
    fn multi_word_name_is_malformed() {
        assert!(parse("my var is 5").unwrap_err().is_malformed());
    }
}
