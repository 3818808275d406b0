//! Shared test utilities for the lectern test suite.
//!
//! Provides the fixture lesson repository plus lookup helpers and bulk
//! extractors over content trees.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let tree = TreeBuilder::new(tmp.path(), ContentConfig::default()).build("");
//!
//! let arrays = find_node(&tree, "Arrays");
//! assert_eq!(names(arrays.children())[0], "README.md");
//! assert_eq!(leaf_paths(&tree).len(), 11);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::tree::ContentNode;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/content/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Tree lookups (panic with a clear message on miss)
// =========================================================================

/// Find a direct child by name. Panics if not found.
pub fn find_node<'a>(nodes: &'a [ContentNode], name: &str) -> &'a ContentNode {
    nodes.iter().find(|n| n.name == name).unwrap_or_else(|| {
        let available = names(nodes);
        panic!("node '{name}' not found. Available: {available:?}")
    })
}

/// Find a node anywhere in the tree by relative path. Panics if not found.
pub fn find_path<'a>(nodes: &'a [ContentNode], path: &str) -> &'a ContentNode {
    fn search<'a>(nodes: &'a [ContentNode], path: &str) -> Option<&'a ContentNode> {
        nodes.iter().find_map(|n| {
            if n.path == path {
                Some(n)
            } else {
                search(n.children(), path)
            }
        })
    }
    search(nodes, path).unwrap_or_else(|| {
        let available = all_paths(nodes);
        panic!("path '{path}' not found. Available: {available:?}")
    })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// Names of one level, in tree order.
pub fn names(nodes: &[ContentNode]) -> Vec<&str> {
    nodes.iter().map(|n| n.name.as_str()).collect()
}

/// Every path in the tree (directories included), pre-order.
pub fn all_paths(nodes: &[ContentNode]) -> Vec<String> {
    let mut out = Vec::new();
    for node in nodes {
        out.push(node.path.clone());
        out.extend(all_paths(node.children()));
    }
    out
}

/// Leaf paths only, pre-order.
pub fn leaf_paths(nodes: &[ContentNode]) -> Vec<String> {
    let mut out = Vec::new();
    for node in nodes {
        if node.is_leaf() {
            out.push(node.path.clone());
        } else {
            out.extend(leaf_paths(node.children()));
        }
    }
    out
}
