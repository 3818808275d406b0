//! Content tree construction.
//!
//! Walks the repository being served and produces an ordered, fully
//! materialized tree of the entries the site shows: directories, markdown
//! documents, and code files.
//!
//! ## What Gets Included
//!
//! ```text
//! repo/                              # Content root
//! ├── README.md                      # excluded here (root level only)
//! ├── GETTING_STARTED.md             # excluded everywhere
//! ├── .git/  .github/  node_modules/ website/    # excluded everywhere
//! ├── Arrays/
//! │   ├── README.md                  # kept: only the root README is hidden
//! │   ├── theory.md                  # markdown leaf
//! │   ├── two_sum_easy.dart          # code leaf, external ref "abc123"
//! │   ├── two_sum_easy.txt           # sidecar, not a node
//! │   └── diagram.png                # unknown extension, skipped
//! └── Sorting/ ...
//! ```
//!
//! ## Failure Handling
//!
//! Building never fails as a whole. An unreadable directory (missing,
//! permission denied, symlink loop) contributes an empty child list and a
//! logged warning; an unreadable or malformed sidecar yields no external ref
//! while the code file itself stays in the tree.
//!
//! ## Concurrency
//!
//! Subdirectories of one level are built in parallel with rayon. Every level
//! is sorted with [`ordering::sort_nodes`] after its children are collected, so
//! completion order never leaks into the result.

use crate::config::ContentConfig;
use crate::metadata;
use crate::ordering;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Not found: {0}")]
    NotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Malformed metadata file: {0}")]
    MalformedMetadata(PathBuf),
    #[error("Directory cycle at {0}")]
    TraversalCycle(PathBuf),
    #[error("Path escapes the content root: {0}")]
    OutsideRoot(String),
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ContentError {
    /// Map an IO error on `path` onto the content error taxonomy.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// One entry of the content tree.
///
/// `path` is relative to the content root with `/` separators and is unique
/// within a tree; it is the identifier used for navigation and lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentNode {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Directory {
        children: Vec<ContentNode>,
    },
    Markdown,
    Code {
        #[serde(rename = "gistId")]
        external_ref_id: Option<String>,
    },
}

impl ContentNode {
    pub fn is_leaf(&self) -> bool {
        !matches!(self.kind, NodeKind::Directory { .. })
    }

    /// Children of a directory; empty for leaves.
    pub fn children(&self) -> &[ContentNode] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            _ => &[],
        }
    }

    pub fn external_ref_id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Code { external_ref_id } => external_ref_id.as_deref(),
            _ => None,
        }
    }
}

/// How a file is treated, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Markdown,
    Code,
    Other,
}

impl FileKind {
    pub fn of(content: &ContentConfig, name: &str) -> Self {
        let Some(ext) = Path::new(name).extension().map(|e| e.to_string_lossy()) else {
            return FileKind::Other;
        };
        let listed = |list: &[String]| list.iter().any(|x| ext.eq_ignore_ascii_case(x));
        if listed(&content.doc_extensions) {
            FileKind::Markdown
        } else if listed(&content.code_extensions) {
            FileKind::Code
        } else {
            FileKind::Other
        }
    }
}

/// Join a request-supplied relative path onto the content root.
///
/// Only plain components are accepted; `..`, absolute paths, and drive
/// prefixes are rejected so lookups can never leave the root.
pub fn resolve_relative(root: &Path, relative: &str) -> Result<PathBuf, ContentError> {
    let mut resolved = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ContentError::OutsideRoot(relative.to_string()));
            }
        }
    }
    Ok(resolved)
}

/// Join a child name onto a relative parent path.
fn join_relative(parent: &str, name: &str) -> String {
    let parent = parent.trim_matches('/');
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// A directory entry with its type resolved (symlinks followed).
struct Entry {
    name: String,
    is_dir: bool,
}

/// Builds ordered content trees rooted at a fixed directory.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    root: PathBuf,
    content: ContentConfig,
}

impl TreeBuilder {
    pub fn new(root: impl Into<PathBuf>, content: ContentConfig) -> Self {
        Self {
            root: root.into(),
            content,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build the ordered tree under `relative` (`""` for the whole root).
    pub fn build(&self, relative: &str) -> Vec<ContentNode> {
        let relative = relative.trim_matches('/');
        if let Err(err) = resolve_relative(&self.root, relative) {
            warn!(path = relative, error = %err, "refusing to build tree");
            return Vec::new();
        }
        self.build_dir(relative, &[])
    }

    fn build_dir(&self, relative: &str, ancestors: &[PathBuf]) -> Vec<ContentNode> {
        match self.read_level(relative, ancestors) {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(path = relative, error = %err, "skipping unreadable directory");
                Vec::new()
            }
        }
    }

    fn read_level(
        &self,
        relative: &str,
        ancestors: &[PathBuf],
    ) -> Result<Vec<ContentNode>, ContentError> {
        let full = resolve_relative(&self.root, relative)?;
        let canonical = full
            .canonicalize()
            .map_err(|e| ContentError::from_io(&full, e))?;
        if ancestors.contains(&canonical) {
            return Err(ContentError::TraversalCycle(full));
        }
        let mut lineage = ancestors.to_vec();
        lineage.push(canonical);

        let at_root = relative.is_empty();
        let entries: Vec<Entry> = list_entries(&full)?
            .into_iter()
            .filter(|e| !self.content.is_excluded(&e.name, at_root))
            .collect();

        let mut nodes: Vec<ContentNode> = entries
            .into_par_iter()
            .filter_map(|entry| self.build_entry(relative, entry, &lineage))
            .collect();

        ordering::sort_nodes(&mut nodes);
        Ok(nodes)
    }

    fn build_entry(&self, parent: &str, entry: Entry, lineage: &[PathBuf]) -> Option<ContentNode> {
        let path = join_relative(parent, &entry.name);
        let kind = if entry.is_dir {
            NodeKind::Directory {
                children: self.build_dir(&path, lineage),
            }
        } else {
            match FileKind::of(&self.content, &entry.name) {
                FileKind::Markdown => NodeKind::Markdown,
                FileKind::Code => NodeKind::Code {
                    external_ref_id: self.external_ref_id(&path),
                },
                FileKind::Other => return None,
            }
        };
        Some(ContentNode {
            name: entry.name,
            path,
            kind,
        })
    }

    fn external_ref_id(&self, relative: &str) -> Option<String> {
        let file = self.root.join(relative);
        match metadata::resolve_external_ref(&file, &self.content.metadata_extension) {
            Ok(id) => id,
            Err(err) => {
                warn!(path = relative, error = %err, "ignoring sidecar metadata");
                None
            }
        }
    }
}

/// List a directory, sorted by name, with symlinks resolved.
///
/// Entries whose type can't be determined (dangling symlinks) are skipped.
fn list_entries(dir: &Path) -> Result<Vec<Entry>, ContentError> {
    let read = fs::read_dir(dir).map_err(|e| ContentError::from_io(dir, e))?;
    let mut entries = Vec::new();
    for item in read {
        let item = item.map_err(|e| ContentError::from_io(dir, e))?;
        let name = item.file_name().to_string_lossy().into_owned();
        match fs::metadata(item.path()) {
            Ok(meta) => entries.push(Entry {
                name,
                is_dir: meta.is_dir(),
            }),
            Err(err) => debug!(entry = %item.path().display(), error = %err, "skipping entry"),
        }
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
