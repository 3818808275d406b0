//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity leads with its positional index and name; details (difficulty,
//! external refs, explanations) follow as tags or indented context lines.
//!
//! ## Tree
//!
//! ```text
//! 001 Arrays/
//!     001 README.md
//!     002 theory.md
//!     003 two_sum_easy.dart [easy] gist:abc123
//! 002 Sorting/
//!     001 introduction.md
//!     002 easy/ [easy]
//!         001 bubble_sort.dart
//! ```
//!
//! ## Show
//!
//! ```text
//! Arrays/theory.md
//!     Previous: Arrays/README.md
//!     Next: Arrays/two_sum_easy.dart
//!     Array theory An array stores elements side by side...
//! ```
//!
//! ## Quiz
//!
//! ```text
//! arrays (2 questions)
//! 001 What is the time complexity of indexing an array?
//!     a) O(1) ✓
//!     b) O(log n)
//!     Explanation: Elements are stored contiguously...
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::navigate;
use crate::ordering::{Difficulty, Entry};
use crate::quiz::Question;
use crate::site::Lookup;
use crate::tree::{ContentNode, NodeKind};

/// Characters of rendered content shown by `show`.
const PREVIEW_CHARS: usize = 120;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

/// Decode the entities the renderer and maud produce.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse whitespace runs and truncate to `max` characters, appending
/// `...` if truncated.
fn preview(text: &str, max: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max {
        collapsed
    } else {
        let cut: String = collapsed.chars().take(max).collect();
        format!("{cut}...")
    }
}

/// `a)`, `b)`, … for option lists; falls back to numbers past `z`.
fn option_label(i: usize) -> String {
    match u8::try_from(i).ok().filter(|&i| i < 26) {
        Some(i) => format!("{})", (b'a' + i) as char),
        None => format!("{})", i + 1),
    }
}

/// Tags shown after a node name: difficulty and external ref.
fn node_tags(node: &ContentNode) -> String {
    let mut tags = String::new();
    if let Some(d) = Difficulty::of_entry(Entry::of(node)) {
        tags.push_str(&format!(" [{}]", d.as_str()));
    }
    if let Some(id) = node.external_ref_id() {
        tags.push_str(&format!(" gist:{id}"));
    }
    tags
}

// ============================================================================
// Tree
// ============================================================================

/// Format the ordered content tree, one line per node.
pub fn format_tree(tree: &[ContentNode]) -> Vec<String> {
    let mut lines = Vec::new();
    format_level(tree, 0, &mut lines);
    lines
}

fn format_level(nodes: &[ContentNode], depth: usize, lines: &mut Vec<String>) {
    for (i, node) in nodes.iter().enumerate() {
        let suffix = if node.is_leaf() { "" } else { "/" };
        lines.push(format!(
            "{}{} {}{}{}",
            indent(depth),
            format_index(i + 1),
            node.name,
            suffix,
            node_tags(node)
        ));
        format_level(node.children(), depth + 1, lines);
    }
}

/// One-line totals for a tree.
pub fn format_tree_summary(tree: &[ContentNode]) -> String {
    fn walk(nodes: &[ContentNode], counts: &mut (usize, usize, usize, usize)) {
        for node in nodes {
            match &node.kind {
                NodeKind::Directory { children } => {
                    counts.0 += 1;
                    walk(children, counts);
                }
                NodeKind::Markdown => counts.1 += 1,
                NodeKind::Code { external_ref_id } => {
                    counts.2 += 1;
                    if external_ref_id.is_some() {
                        counts.3 += 1;
                    }
                }
            }
        }
    }
    let mut counts = (0, 0, 0, 0);
    walk(tree, &mut counts);
    let (dirs, docs, code, gists) = counts;
    format!(
        "{dirs} directories, {} lessons ({docs} documents, {code} code files, {gists} with gists)",
        docs + code
    )
}

pub fn print_tree(tree: &[ContentNode]) {
    for line in format_tree(tree) {
        println!("{}", line);
    }
    println!();
    println!("{}", format_tree_summary(tree));
}

// ============================================================================
// Show
// ============================================================================

/// Format a lookup: the path, its neighbours, and a plain-text preview.
pub fn format_lookup(lookup: &Lookup) -> Vec<String> {
    let mut lines = vec![lookup.selected_path.clone()];
    let nav = &lookup.navigation;
    if let Some(prev) = &nav.previous {
        lines.push(format!("{}Previous: {}", indent(1), prev.path));
    }
    if let Some(next) = &nav.next {
        lines.push(format!("{}Next: {}", indent(1), next.path));
    }
    if let Some(id) = &lookup.rendered.external_ref_id {
        lines.push(format!("{}Gist: {}", indent(1), id));
    }
    let text = preview(
        &decode_entities(&strip_html_tags(&lookup.rendered.html)),
        PREVIEW_CHARS,
    );
    if !text.is_empty() {
        lines.push(format!("{}{}", indent(1), text));
    }
    lines
}

pub fn print_lookup(lookup: &Lookup) {
    for line in format_lookup(lookup) {
        println!("{}", line);
    }
}

/// Format the flattened reading order.
pub fn format_sequence(tree: &[ContentNode]) -> Vec<String> {
    navigate::flatten(tree)
        .iter()
        .enumerate()
        .map(|(i, node)| format!("{} {}", format_index(i + 1), node.path))
        .collect()
}

// ============================================================================
// Quiz
// ============================================================================

/// Format a quiz: each question with lettered options, the correct one marked.
pub fn format_quiz(quiz_type: &str, questions: &[Question]) -> Vec<String> {
    let noun = if questions.len() == 1 { "question" } else { "questions" };
    let mut lines = vec![format!("{} ({} {})", quiz_type, questions.len(), noun)];
    for (n, q) in questions.iter().enumerate() {
        lines.push(format!("{} {}", format_index(n + 1), q.question));
        let correct = q.answer_index();
        for (i, option) in q.options.iter().enumerate() {
            let mark = if correct == Some(i) { " ✓" } else { "" };
            lines.push(format!("{}{} {}{}", indent(1), option_label(i), option, mark));
        }
        if let Some(explanation) = &q.explanation {
            lines.push(format!("{}Explanation: {}", indent(1), explanation));
        }
    }
    lines
}

pub fn print_quiz(quiz_type: &str, questions: &[Question]) {
    for line in format_quiz(quiz_type, questions) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
