//! Previous/next navigation across lessons.
//!
//! The ordered tree is linearized pre-order into leaves only: a directory has
//! no position of its own, its children appear inline where the directory
//! sits among its siblings. Moving "next" from the last lesson of one
//! directory therefore lands on the first lesson of the following one.

use crate::tree::ContentNode;
use serde::Serialize;

/// Neighbours of one path in the flattened sequence.
///
/// Both sides are `None` when the path is not a leaf of the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavigationResult {
    #[serde(rename = "prev")]
    pub previous: Option<ContentNode>,
    pub next: Option<ContentNode>,
}

/// Pre-order, leaves-only linearization of the tree.
pub fn flatten(tree: &[ContentNode]) -> Vec<&ContentNode> {
    let mut leaves = Vec::new();
    collect_leaves(tree, &mut leaves);
    leaves
}

fn collect_leaves<'a>(nodes: &'a [ContentNode], leaves: &mut Vec<&'a ContentNode>) {
    for node in nodes {
        if node.is_leaf() {
            leaves.push(node);
        } else {
            collect_leaves(node.children(), leaves);
        }
    }
}

/// Locate `target` (exact match on the relative path) and return its neighbours.
pub fn find_neighbors(tree: &[ContentNode], target: &str) -> NavigationResult {
    let leaves = flatten(tree);
    let Some(index) = leaves.iter().position(|leaf| leaf.path == target) else {
        return NavigationResult::default();
    };
    NavigationResult {
        previous: index
            .checked_sub(1)
            .and_then(|i| leaves.get(i))
            .map(|n| (*n).clone()),
        next: leaves.get(index + 1).map(|n| (*n).clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentConfig;
    use crate::test_helpers::*;
    use crate::tree::{NodeKind, TreeBuilder};

    fn leaf(path: &str) -> ContentNode {
        ContentNode {
            name: path.rsplit('/').next().unwrap().to_string(),
            path: path.to_string(),
            kind: NodeKind::Markdown,
        }
    }

    fn dir(path: &str, children: Vec<ContentNode>) -> ContentNode {
        ContentNode {
            name: path.rsplit('/').next().unwrap().to_string(),
            path: path.to_string(),
            kind: NodeKind::Directory { children },
        }
    }

    fn abc() -> Vec<ContentNode> {
        vec![leaf("A"), leaf("B"), leaf("C")]
    }

    #[test]
    fn middle_has_both_neighbours() {
        let tree = abc();
        let nav = find_neighbors(&tree, "B");
        assert_eq!(nav.previous.unwrap().path, "A");
        assert_eq!(nav.next.unwrap().path, "C");
    }

    #[test]
    fn first_has_no_previous() {
        let tree = abc();
        let nav = find_neighbors(&tree, "A");
        assert!(nav.previous.is_none());
        assert_eq!(nav.next.unwrap().path, "B");
    }

    #[test]
    fn last_has_no_next() {
        let tree = abc();
        let nav = find_neighbors(&tree, "C");
        assert_eq!(nav.previous.unwrap().path, "B");
        assert!(nav.next.is_none());
    }

    #[test]
    fn missing_path_has_no_neighbours() {
        let tree = abc();
        assert_eq!(find_neighbors(&tree, "missing"), NavigationResult::default());
    }

    #[test]
    fn directory_path_is_not_a_position() {
        let tree = vec![dir("D", vec![leaf("D/x")]), leaf("y")];
        assert_eq!(find_neighbors(&tree, "D"), NavigationResult::default());
    }

    #[test]
    fn single_leaf_has_no_neighbours() {
        let tree = vec![leaf("only")];
        assert_eq!(find_neighbors(&tree, "only"), NavigationResult::default());
    }

    #[test]
    fn flatten_is_preorder_leaves_only() {
        let tree = vec![
            leaf("a"),
            dir("D", vec![leaf("D/x"), dir("D/E", vec![leaf("D/E/y")]), leaf("D/z")]),
            dir("Empty", vec![]),
            leaf("b"),
        ];
        let paths: Vec<&str> = flatten(&tree).iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "D/x", "D/E/y", "D/z", "b"]);
    }

    #[test]
    fn navigation_crosses_directories_in_fixtures() {
        let tmp = setup_fixtures();
        let tree = TreeBuilder::new(tmp.path(), ContentConfig::default()).build("");

        let nav = find_neighbors(&tree, "Arrays/notes.md");
        assert_eq!(
            nav.previous.unwrap().path,
            "Arrays/trapping_rain_water_hard.dart"
        );
        assert_eq!(nav.next.unwrap().path, "Sorting/introduction.md");

        let nav = find_neighbors(&tree, "Sorting/easy/bubble_sort.dart");
        assert_eq!(nav.previous.unwrap().path, "Sorting/introduction.md");
        assert_eq!(nav.next.unwrap().path, "Sorting/medium/quick_sort.dart");
    }

    #[test]
    fn flatten_matches_leaf_helper() {
        let tmp = setup_fixtures();
        let tree = TreeBuilder::new(tmp.path(), ContentConfig::default()).build("");
        let flat: Vec<String> = flatten(&tree).iter().map(|n| n.path.clone()).collect();
        assert_eq!(flat, leaf_paths(&tree));
        assert_eq!(flat.len(), 11);
    }

    #[test]
    fn serializes_as_prev_next() {
        let tree = abc();
        let json = serde_json::to_value(find_neighbors(&tree, "A")).unwrap();
        assert!(json["prev"].is_null());
        assert_eq!(json["next"]["path"], "B");
    }
}
