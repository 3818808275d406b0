//! The content-browsing operations the web surface is built on.
//!
//! A [`Site`] owns the tree builder and renderer for one content root and
//! answers the two questions every page asks: what does the tree look like,
//! and what is at this path (rendered, with its neighbours). Nothing here
//! knows about HTTP or authentication.

use crate::config::SiteConfig;
use crate::navigate::{self, NavigationResult};
use crate::render::{RenderedContent, Renderer};
use crate::tree::{ContentError, ContentNode, TreeBuilder};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of looking up one path: the tree, the rendered file, and its
/// position in the flattened sequence.
///
/// Serializes to the file-content wire shape:
/// `{"content": …, "gistId": …, "prevNext": {"prev": …, "next": …}}`.
#[derive(Debug, Clone, Serialize)]
pub struct Lookup {
    #[serde(skip)]
    pub tree: Vec<ContentNode>,
    /// Path the content was rendered from (the default document when none
    /// was requested).
    #[serde(skip)]
    pub selected_path: String,
    #[serde(flatten)]
    pub rendered: RenderedContent,
    #[serde(rename = "prevNext")]
    pub navigation: NavigationResult,
}

/// A rendered file shown on its own.
#[derive(Debug, Clone)]
pub struct Fullscreen {
    pub title: String,
    pub rendered: RenderedContent,
}

#[derive(Debug)]
pub struct Site {
    builder: TreeBuilder,
    renderer: Renderer,
    default_document: String,
    title: String,
}

impl Site {
    pub fn new(root: impl Into<PathBuf>, config: &SiteConfig) -> Self {
        let root = root.into();
        Self {
            builder: TreeBuilder::new(root.clone(), config.content.clone()),
            renderer: Renderer::new(root, config.content.clone()),
            default_document: config.content.default_document.clone(),
            title: config.title.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        self.builder.root()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The ordered tree of the whole content root.
    pub fn tree(&self) -> Vec<ContentNode> {
        self.builder.build("")
    }

    /// Build the tree, render `path` and find its neighbours.
    ///
    /// Without a path the default document is rendered and no navigation is
    /// computed. A missing or unreadable file is not an error here, it
    /// renders as the error payload. The operation only fails when the
    /// content root itself can't be read.
    pub fn lookup(&self, path: Option<&str>) -> Result<Lookup, ContentError> {
        self.check_root()?;
        let tree = self.tree();

        let requested = path.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty());
        let (selected_path, navigation) = match requested {
            Some(p) => (p.to_string(), navigate::find_neighbors(&tree, p)),
            None => (self.default_document.clone(), NavigationResult::default()),
        };
        debug!(path = %selected_path, "lookup");

        let rendered = self.renderer.render(&selected_path);
        Ok(Lookup {
            tree,
            selected_path,
            rendered,
            navigation,
        })
    }

    /// Render `path` (the default document when absent) for standalone
    /// display. The title is the last segment of the path.
    pub fn fullscreen(&self, path: Option<&str>) -> Fullscreen {
        let path = path
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.default_document);
        let title = path
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.title)
            .to_string();
        Fullscreen {
            title,
            rendered: self.renderer.render(path),
        }
    }

    fn check_root(&self) -> Result<(), ContentError> {
        let root = self.root();
        let meta = fs::metadata(root).map_err(|e| ContentError::from_io(root, e))?;
        if !meta.is_dir() {
            return Err(ContentError::NotFound(root.to_path_buf()));
        }
        fs::read_dir(root).map_err(|e| ContentError::from_io(root, e))?;
        Ok(())
    }
}
