//! Splitting of list-like step arguments.

use std::sync::LazyLock;

use regex::Regex;

/// Newline or `', '` between quoted names.
static STRINGS_DELIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\r?\n|'\s*,\s*'").expect("strings delimiter is a valid regex")
});

/// Newline or a comma.
static EXPRESSIONS_DELIM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\r?\n|\s*,\s*").expect("expressions delimiter is a valid regex")
});

/// Characters trimmed from both ends of quoted names.
const STRINGS_TRIMMED: &[char] = &['\'', ' ', '\t'];

/// Split a list of possibly quoted names.
///
/// Items are separated by newlines or by `', '`; quotes, spaces and tabs are
/// trimmed from each item and empty items are dropped.
///
/// ```
/// use rule_steps::text::split_strings;
///
/// assert_eq!(split_strings("'before', 'after'"), ["before", "after"]);
/// ```
#[must_use]
pub fn split_strings(text: &str) -> Vec<String> {
    split_string_items(text)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Like [`split_strings`], but pairs each name with its item as written.
///
/// The raw item is only stripped of surrounding whitespace.
pub fn split_string_items(text: &str) -> impl Iterator<Item = (&str, &str)> {
    STRINGS_DELIM
        .split(text)
        .map(|item| (item.trim(), item.trim_matches(STRINGS_TRIMMED)))
        .filter(|(_, name)| !name.is_empty())
}

/// Split text into trimmed, non-empty lines.
#[must_use]
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a comma or newline separated list of expressions.
#[must_use]
pub fn split_expressions(text: &str) -> Vec<String> {
    EXPRESSIONS_DELIM
        .split(text)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_on_newlines() {
        let items = split_strings("  rule one\n\n\t'rule two'\r\n");
        assert_eq!(items, ["rule one", "rule two"]);
    }

    #[test]
    fn strings_inline_quoted() {
        let items = split_strings("'input call', 'drop dial-up if callee is talking'");
        assert_eq!(items, ["input call", "drop dial-up if callee is talking"]);
    }

    #[test]
    fn string_items_keep_raw_text() {
        let items: Vec<_> = split_string_items(" 'input call' - many\n'b'").collect();
        assert_eq!(items, [("'input call' - many", "input call' - many"), ("'b", "b")]);
    }

    #[test]
    fn strings_keep_inner_commas() {
        let items = split_strings("'a, b'");
        assert_eq!(items, ["a, b"]);
    }

    #[test]
    fn lines_trimmed() {
        assert_eq!(split_lines(" a \n\n b\r\n"), ["a", "b"]);
    }

    #[test]
    fn expressions_by_comma_and_newline() {
        let items = split_expressions("dial1, dial2\n call ,");
        assert_eq!(items, ["dial1", "dial2", "call"]);
    }

    #[test]
    fn empty_input() {
        assert!(split_strings("").is_empty());
        assert!(split_lines("   ").is_empty());
        assert!(split_expressions(" , ").is_empty());
    }
}
