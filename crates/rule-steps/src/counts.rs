//! Parsing of expected activation counts.
//!
//! ```text
//! 'input call' - 3
//! drop dial-up, 2
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, StepError};
use crate::text::split_string_items;

/// Rule name, optional quotes, a separator (comma, dash or whitespace) and a count.
static COUNT_OF_ACTIVATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^'?(?P<rule>.*?)'?(?:\s*,\s*-?\s*|\s*-\s*|\s+)(?P<count>\d+)$")
        .expect("activation count pattern is a valid regex")
});

/// Expected activation count per rule name.
pub type ActivationCountMap = BTreeMap<String, u32>;

/// Parse one `rule - count` line per entry.
///
/// Entries are separated by newlines or `', '`. Any entry not of the expected
/// shape fails the whole block with [`StepError::MalformedDirective`] naming
/// the entry verbatim. A rule listed twice keeps its last count.
pub fn parse_counts(block: &str) -> Result<ActivationCountMap> {
    let mut counts = ActivationCountMap::new();
    for (raw, line) in split_string_items(block) {
        let caps = COUNT_OF_ACTIVATED
            .captures(line)
            .ok_or_else(|| StepError::malformed("cannot parse count of activations", raw))?;
        let rule = caps["rule"].trim();
        if rule.is_empty() {
            return Err(StepError::malformed("missing rule name", raw));
        }
        let count = caps["count"]
            .parse::<u32>()
            .map_err(|_| StepError::malformed("activation count out of range", raw))?;
        counts.insert(rule.to_string(), count);
    }
    tracing::debug!(rules = counts.len(), "parsed activation counts");
    Ok(counts)
}
