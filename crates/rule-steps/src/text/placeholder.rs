//! Placeholder substitution.
//!
//! Two placeholder forms may appear anywhere in step text:
//!
//! - short form `${expr}`, closed by the first `}`;
//! - long form `$${expr}$`, closed by the first `}$`.
//!
//! At each position the long form is tried first. An expression never
//! contains `${`; a candidate whose expression would contain one is not a
//! placeholder. Substitution is a single left-to-right pass and substituted
//! text is never scanned again.

use crate::error::Result;
use crate::eval::{ExpressionEvaluator, VariableContext, render};

const SHORT_OPEN: &str = "${";
const SHORT_CLOSE: &str = "}";
const LONG_OPEN: &str = "$${";
const LONG_CLOSE: &str = "}$";

/// A placeholder found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderMatch {
    /// The whole placeholder, delimiters included.
    pub full_text: String,
    /// The expression between the delimiters.
    pub expression: String,
    /// Whether this is the `$${expr}$` form.
    pub long_form: bool,
    /// Byte offset of the placeholder start.
    pub start: usize,
    /// Byte offset just past the placeholder end.
    pub end: usize,
}

/// Try to read a placeholder of one form starting at `start`.
fn match_form(
    text: &str,
    start: usize,
    open: &str,
    close: &str,
    long_form: bool,
) -> Option<PlaceholderMatch> {
    if !text[start..].starts_with(open) {
        return None;
    }
    let body_start = start + open.len();
    let body_len = text[body_start..].find(close)?;
    let expression = &text[body_start..body_start + body_len];
    if expression.contains(SHORT_OPEN) {
        return None;
    }
    let end = body_start + body_len + close.len();
    Some(PlaceholderMatch {
        full_text: text[start..end].to_string(),
        expression: expression.to_string(),
        long_form,
        start,
        end,
    })
}

fn match_at(text: &str, start: usize) -> Option<PlaceholderMatch> {
    match_form(text, start, LONG_OPEN, LONG_CLOSE, true)
        .or_else(|| match_form(text, start, SHORT_OPEN, SHORT_CLOSE, false))
}

/// Find all placeholders in `text`, left to right, without overlaps.
#[must_use]
pub fn find_placeholders(text: &str) -> Vec<PlaceholderMatch> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('$') {
        let start = pos + offset;
        if let Some(m) = match_at(text, start) {
            pos = m.end;
            found.push(m);
        } else {
            pos = start + 1;
        }
    }
    found
}

/// Replace every placeholder in `text` with its evaluated, rendered value.
///
/// Expressions are evaluated in order of appearance against `context`, so
/// side effects of one placeholder are visible to the next. Any evaluation
/// failure aborts the whole substitution.
pub fn substitute(
    text: &str,
    evaluator: &dyn ExpressionEvaluator,
    context: &mut VariableContext,
) -> Result<String> {
    let placeholders = find_placeholders(text);
    if placeholders.is_empty() {
        return Ok(text.to_string());
    }

    let mut output = String::with_capacity(text.len());
    let mut last = 0;
    for placeholder in placeholders {
        output.push_str(&text[last..placeholder.start]);
        let value = evaluator.evaluate(&placeholder.expression, context)?;
        tracing::trace!(
            placeholder = %placeholder.full_text,
            long_form = placeholder.long_form,
            "substituted"
        );
        output.push_str(&render(&value));
        last = placeholder.end;
    }
    output.push_str(&text[last..]);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::{RhaiEvaluator, Value};

    fn expressions(text: &str) -> Vec<String> {
        find_placeholders(text)
            .into_iter()
            .map(|m| m.expression)
            .collect()
    }

    #[test]
    fn finds_short_form() {
        let found = find_placeholders("a${1+1}b");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full_text, "${1+1}");
        assert_eq!(found[0].expression, "1+1");
        assert!(!found[0].long_form);
        assert_eq!((found[0].start, found[0].end), (1, 7));
    }

    #[test]
    fn finds_long_form() {
        let found = find_placeholders("a$${1+1}$b");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full_text, "$${1+1}$");
        assert!(found[0].long_form);
    }

    #[test]
    fn long_form_may_contain_braces() {
        assert_eq!(expressions("$${ #{a: 1}.a }$"), [" #{a: 1}.a "]);
    }

    #[test]
    fn falls_back_to_short_form_without_long_close() {
        let found = find_placeholders("$${x}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].full_text, "${x}");
        assert_eq!(found[0].start, 1);
    }

    #[test]
    fn nested_open_is_not_a_placeholder() {
        assert_eq!(expressions("${a${b}"), ["b"]);
    }

    #[test]
    fn many_placeholders() {
        assert_eq!(expressions("${a}-$${b}$-${c}"), ["a", "b", "c"]);
    }

    #[test]
    fn unclosed_is_plain_text() {
        assert!(find_placeholders("cost: $5 ${unclosed").is_empty());
    }

    #[test]
    fn substitute_both_forms() {
        let evaluator = RhaiEvaluator::new();
        let mut ctx = VariableContext::new();
        let short = substitute("a${1+1}b", &evaluator, &mut ctx).unwrap();
        let long = substitute("a$${1+1}$b", &evaluator, &mut ctx).unwrap();
        assert_eq!(short, "a2b");
        assert_eq!(long, "a2b");
    }

    #[test]
    fn unit_renders_empty() {
        let evaluator = RhaiEvaluator::new();
        let mut ctx = VariableContext::new();
        assert_eq!(substitute("[${()}]", &evaluator, &mut ctx).unwrap(), "[]");
    }

    #[test]
    fn result_is_not_rescanned() {
        let evaluator = RhaiEvaluator::new();
        let mut ctx = VariableContext::new();
        ctx.define("tpl", Value::from("${1+1}".to_string()));
        assert_eq!(
            substitute("<${tpl}>", &evaluator, &mut ctx).unwrap(),
            "<${1+1}>"
        );
    }

    #[test]
    fn left_to_right_side_effects() {
        let evaluator = RhaiEvaluator::new();
        let mut ctx = VariableContext::new();
        ctx.define("n", Value::from(0_i64));
        let out = substitute("${n = n + 1}${n}-${n * 10}", &evaluator, &mut ctx).unwrap();
        assert_eq!(out, "1-10");
    }

    #[test]
    fn failure_names_expression() {
        let evaluator = RhaiEvaluator::new();
        let mut ctx = VariableContext::new();
        let err = substitute("ok ${1} then ${nope}", &evaluator, &mut ctx).unwrap_err();
        assert!(err.is_unresolvable());
        assert_eq!(err.text(), Some("nope"));
    }
}
