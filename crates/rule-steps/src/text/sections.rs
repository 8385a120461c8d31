//! Grouping of multi-line blocks into keyword sections.
//!
//! A block such as
//!
//! ```text
//! classpath:/a.drl
//! classpath:/b.drl
//! ignore rules: 'r1', 'r2'
//! log resources: true
//! ```
//!
//! is split into list buckets (`resources`, `ignore rules`) and boolean flags
//! (`log resources`). A header line may appear anywhere; it switches the
//! current bucket, or sets a flag and is otherwise consumed.

use std::collections::HashMap;

use regex::Regex;

use super::split::split_strings;

/// What a section header feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    List(String),
    Flag(String),
}

#[derive(Debug, Clone)]
struct Header {
    keyword: String,
    pattern: Regex,
    target: Target,
}

impl Header {
    fn new(keyword: &str, target: Target) -> Self {
        let pattern = Regex::new(&format!(r"^,?\s*{}:?\s+'?(?P<rest>.*)$", regex::escape(keyword)))
            .expect("escaped keyword always forms a valid regex");
        Self {
            keyword: keyword.to_string(),
            pattern,
            target,
        }
    }
}

/// Splits blocks into list buckets and boolean flags by section keyword.
#[derive(Debug, Clone)]
pub struct SectionSplitter {
    default_bucket: String,
    headers: Vec<Header>,
}

impl SectionSplitter {
    /// Create a splitter whose unheaded lines go to `default_bucket`.
    #[must_use]
    pub fn new(default_bucket: impl Into<String>) -> Self {
        Self {
            default_bucket: default_bucket.into(),
            headers: Vec::new(),
        }
    }

    /// Register a header that switches lines into a list bucket.
    ///
    /// Headers are tested in registration order.
    #[must_use]
    pub fn list(mut self, keyword: &str, bucket: impl Into<String>) -> Self {
        self.headers
            .push(Header::new(keyword, Target::List(bucket.into())));
        self
    }

    /// Register a header that sets a boolean flag.
    #[must_use]
    pub fn flag(mut self, keyword: &str, flag: impl Into<String>) -> Self {
        self.headers
            .push(Header::new(keyword, Target::Flag(flag.into())));
        self
    }

    /// Group the lines of `block`.
    #[must_use]
    pub fn split(&self, block: &str) -> SectionGroups {
        let mut groups = SectionGroups::default();
        let mut current = self.default_bucket.clone();

        for line in split_strings(block) {
            let header = self
                .headers
                .iter()
                .find_map(|h| h.pattern.captures(&line).map(|caps| (h, caps)));

            let item = match header {
                Some((header, caps)) => {
                    let rest = caps.name("rest").map_or("", |m| m.as_str()).trim();
                    match &header.target {
                        Target::List(bucket) => {
                            tracing::trace!(keyword = %header.keyword, "switching bucket");
                            current.clone_from(bucket);
                            rest.to_string()
                        }
                        Target::Flag(flag) => {
                            groups.flags.insert(flag.clone(), parse_bool(rest));
                            continue;
                        }
                    }
                }
                None => line,
            };

            if !item.is_empty() {
                groups.lists.entry(current.clone()).or_default().push(item);
            }
        }

        groups
    }
}

/// Boolean literal parsing: `true` in any case is true, anything else false.
fn parse_bool(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("true")
}

/// The result of splitting a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionGroups {
    lists: HashMap<String, Vec<String>>,
    flags: HashMap<String, bool>,
}

impl SectionGroups {
    /// Lines collected in a bucket, in block order.
    #[must_use]
    pub fn list(&self, bucket: &str) -> &[String] {
        self.lists.get(bucket).map_or(&[], Vec::as_slice)
    }

    /// Take the lines of a bucket out of the groups.
    pub fn take_list(&mut self, bucket: &str) -> Vec<String> {
        self.lists.remove(bucket).unwrap_or_default()
    }

    /// The value of a flag, if its header appeared.
    #[must_use]
    pub fn flag(&self, flag: &str) -> Option<bool> {
        self.flags.get(flag).copied()
    }
}
