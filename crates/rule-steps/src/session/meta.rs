//! Session definitions and per-scenario options parsed from step text.

use crate::config::SessionDefaults;
use crate::text::SectionSplitter;

const RESOURCES: &str = "resources";
const PROPERTIES: &str = "properties";
const IGNORE: &str = "ignore";
const LOG_RESOURCES: &str = "log_resources";
const LOG_FACTS: &str = "log_facts";
const KEEP_FACTS_HISTORY: &str = "keep_facts_history";

/// A rule session definition.
///
/// ```text
/// classpath:/org/phone/rules.drl
/// properties: drools.dateformat=dd-MMM-yyyy
/// ignore rules: 'before', 'after'
/// log resources: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDirectiveBlock {
    /// Rule resource locators.
    pub resource_paths: Vec<String>,
    /// Session properties, one `key=value` per entry.
    pub properties: Vec<String>,
    /// Rules whose activations are not tracked.
    pub ignored_rule_names: Vec<String>,
    /// Log the loaded rule resources.
    pub log_resources: bool,
    /// Log fact insertions and retractions.
    pub log_facts: bool,
    /// Keep a history of facts for later assertions.
    pub keep_facts_history: bool,
}

impl Default for SessionDirectiveBlock {
    fn default() -> Self {
        Self::with_defaults(&SessionDefaults::default())
    }
}

impl SessionDirectiveBlock {
    fn with_defaults(defaults: &SessionDefaults) -> Self {
        Self {
            resource_paths: Vec::new(),
            properties: Vec::new(),
            ignored_rule_names: Vec::new(),
            log_resources: defaults.log_resources,
            log_facts: defaults.log_facts,
            keep_facts_history: defaults.keep_facts_history,
        }
    }

    fn splitter() -> SectionSplitter {
        SectionSplitter::new(RESOURCES)
            .list("properties", PROPERTIES)
            .list("ignore rules", IGNORE)
            .flag("log resources", LOG_RESOURCES)
            .flag("keep facts history", KEEP_FACTS_HISTORY)
            .flag("log facts", LOG_FACTS)
    }

    /// Parse a definition block with the built-in flag defaults.
    #[must_use]
    pub fn parse(block: &str) -> Self {
        Self::parse_with(block, &SessionDefaults::default())
    }

    /// Parse a definition block; flags it does not mention take `defaults`.
    #[must_use]
    pub fn parse_with(block: &str, defaults: &SessionDefaults) -> Self {
        let mut groups = Self::splitter().split(block);
        let fallback = Self::with_defaults(defaults);

        let definition = Self {
            resource_paths: groups.take_list(RESOURCES),
            properties: groups.take_list(PROPERTIES),
            ignored_rule_names: groups.take_list(IGNORE),
            log_resources: groups.flag(LOG_RESOURCES).unwrap_or(fallback.log_resources),
            log_facts: groups.flag(LOG_FACTS).unwrap_or(fallback.log_facts),
            keep_facts_history: groups
                .flag(KEEP_FACTS_HISTORY)
                .unwrap_or(fallback.keep_facts_history),
        };

        tracing::debug!(
            resources = definition.resource_paths.len(),
            properties = definition.properties.len(),
            ignored = definition.ignored_rule_names.len(),
            "parsed session definition"
        );
        definition
    }

    /// Properties as `(key, value)` pairs.
    ///
    /// Entries without `=` are skipped with a warning.
    #[must_use]
    pub fn property_pairs(&self) -> Vec<(String, String)> {
        self.properties
            .iter()
            .filter_map(|entry| match entry.split_once('=') {
                Some((key, value)) => Some((key.trim().to_string(), value.trim().to_string())),
                None => {
                    tracing::warn!(property = %entry, "ignoring session property without '='");
                    None
                }
            })
            .collect()
    }
}

/// Options of a single scenario's session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioMeta {
    /// Rules whose activations are not tracked in this scenario.
    pub ignore: Vec<String>,
}

impl ScenarioMeta {
    /// Parse the tail of `new session for scenario[, ignore '...']`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut groups = SectionSplitter::new("").list("ignore", IGNORE).split(text);
        Self {
            ignore: groups.take_list(IGNORE),
        }
    }

    /// Whether a rule is ignored, by this scenario or by the session definition.
    ///
    /// Patterns may use `*` as a wildcard.
    #[must_use]
    pub fn is_ignored(&self, definition: &SessionDirectiveBlock, rule: &str) -> bool {
        self.ignore
            .iter()
            .chain(&definition.ignored_rule_names)
            .any(|pattern| wildcard_match(pattern, rule))
    }
}

/// Match `text` against a pattern where `*` stands for any run of characters.
#[must_use]
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return text.is_empty();
    };
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
