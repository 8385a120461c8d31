//! Text processing for step sentences.
//!
//! Placeholder substitution, splitting of list-like step arguments, and
//! grouping of multi-line blocks into keyword sections.

pub mod placeholder;
pub mod sections;
pub mod split;

pub use placeholder::{PlaceholderMatch, find_placeholders, substitute};
pub use sections::{SectionGroups, SectionSplitter};
pub use split::{split_expressions, split_lines, split_string_items, split_strings};
