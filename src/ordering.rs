//! Sibling ordering for the content tree.
//!
//! Lesson repositories mix conceptual material with graded exercises. Within a
//! directory, entries are ordered by a ranked list of rules; the first rule that
//! separates two names decides:
//!
//! 1. **Priority content**: names containing `theory`, `introduction`,
//!    `concept` or `readme` (case-insensitive) come first.
//! 2. **Difficulty**: names classified `easy` < `medium` < `hard` come next,
//!    in that order. A name is classified when it equals the word or ends in
//!    `_word`, so `harder` is not `hard`. Files are classified on their stem
//!    (`binary_search_easy.dart`); directories on their full name
//!    (`week.2_hard`).
//! 3. **Name**: case-insensitive ordinal comparison, ties broken by exact
//!    ordinal comparison so the order is strict.
//!
//! A rule "separates" two names when it ranks them differently, or ranks one
//! and not the other (the ranked one sorts first). Because every rule reduces
//! to an optional rank, the comparator is equivalent to comparing the tuple
//! `(rule ranks with None last…, lowercase, exact)` and is a total order.
//!
//! ```text
//! Sorting/
//! ├── introduction.md       priority
//! ├── easy/                 easy
//! ├── medium/               medium
//! ├── hard/                 hard
//! └── overview.md           name
//! ```

use crate::tree::ContentNode;
use std::cmp::Ordering;
use std::path::Path;

/// A sibling as the ordering rules see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    pub name: &'a str,
    pub is_file: bool,
}

impl<'a> Entry<'a> {
    pub fn file(name: &'a str) -> Self {
        Self { name, is_file: true }
    }

    pub fn dir(name: &'a str) -> Self {
        Self { name, is_file: false }
    }

    pub fn of(node: &'a ContentNode) -> Self {
        Self {
            name: &node.name,
            is_file: node.is_leaf(),
        }
    }

    /// The part of the name that carries a difficulty suffix.
    fn stem(&self) -> &'a str {
        if !self.is_file {
            return self.name;
        }
        Path::new(self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(self.name)
    }
}

/// A rule maps an entry to an optional rank; lower ranks sort first.
pub type Rule = fn(Entry<'_>) -> Option<u8>;

/// Rules in precedence order. Priority content outranks difficulty.
pub const RULES: &[Rule] = &[priority_rank, difficulty_rank];

/// Substrings marking introductory or conceptual material.
pub const PRIORITY_MARKERS: &[&str] = &["theory", "introduction", "concept", "readme"];

/// Exercise difficulty encoded in an entry name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Classify a bare name: exact word or `_word` suffix, ignoring case.
    pub fn classify(name: &str) -> Option<Self> {
        let stem = name.to_lowercase();
        Self::ALL.into_iter().find(|d| {
            let word = d.as_str();
            stem == word
                || stem
                    .strip_suffix(word)
                    .is_some_and(|rest| rest.ends_with('_'))
        })
    }

    /// Classify a tree entry; files drop their extension first.
    pub fn of_entry(entry: Entry<'_>) -> Option<Self> {
        Self::classify(entry.stem())
    }
}

/// Whether a name signals introductory or conceptual material.
pub fn is_priority(name: &str) -> bool {
    let lower = name.to_lowercase();
    PRIORITY_MARKERS.iter().any(|m| lower.contains(m))
}

fn priority_rank(entry: Entry<'_>) -> Option<u8> {
    is_priority(entry.name).then_some(0)
}

fn difficulty_rank(entry: Entry<'_>) -> Option<u8> {
    Difficulty::of_entry(entry).map(|d| d as u8)
}

/// Compare two siblings under [`RULES`], falling back to name order.
pub fn compare_entries(a: Entry<'_>, b: Entry<'_>) -> Ordering {
    for rule in RULES {
        match (rule(a), rule(b)) {
            (Some(x), Some(y)) if x != y => return x.cmp(&y),
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            _ => {}
        }
    }
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.name.cmp(b.name))
}

/// Compare two directory names (quiz types, section names).
pub fn compare_names(a: &str, b: &str) -> Ordering {
    compare_entries(Entry::dir(a), Entry::dir(b))
}

/// Sort one directory level in place. `sort_by` is stable.
pub fn sort_nodes(nodes: &mut [ContentNode]) {
    nodes.sort_by(|a, b| compare_entries(Entry::of(a), Entry::of(b)));
}
