//! # Lectern
//!
//! A documentation and quiz browser for lesson repositories. The repository
//! is the data source: directories become sections, markdown files become
//! lessons, code files are shown next to their hosted gist, and JSON files
//! under `Quiz/` become quizzes for signed-in users.
//!
//! # Architecture
//!
//! Every page request runs the same small pipeline against the filesystem:
//!
//! ```text
//! 1. Tree      repo/           →  ordered ContentNode tree
//! 2. Render    one file        →  HTML fragment (+ gist id)
//! 3. Navigate  tree + path     →  previous / next lesson
//! ```
//!
//! Nothing is cached between requests. Edits to the repository show up on
//! the next page load, and there is no index to get out of sync.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`tree`] | Walks the repository into an ordered tree, applying the denylist |
//! | [`ordering`] | Sibling order: priority content, then difficulty, then name |
//! | [`metadata`] | Sidecar files carrying a code file's gist URL |
//! | [`render`] | File → HTML: escaped code, markdown with highlighted fences, error payload |
//! | [`highlight`] | syntect wrapper for fenced code blocks |
//! | [`navigate`] | Pre-order, leaves-only flattening and neighbour lookup |
//! | [`site`] | Tree + render + navigate behind the two content operations |
//! | [`quiz`] | Quiz types and question files |
//! | [`auth`] | GitHub login, sessions, user registry, the [`auth::Gatekeeper`] trait |
//! | [`pages`] | Maud templates for every page |
//! | [`server`] | Pure request router plus the tiny_http loop |
//! | [`config`] | `config.toml` loading, merging, validation, env overrides |
//! | [`logging`] | tracing-subscriber setup |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Ordering Is a Rule List
//!
//! Lesson repositories mix conceptual material with graded exercises. The
//! comparator in [`ordering`] is an explicit list of ranking rules, so the
//! precedence (introductions before exercises, easy before hard) is visible
//! in one place and unit-tested on its own.
//!
//! ## Failures Degrade, Not Abort
//!
//! An unreadable directory empties one subtree, a broken sidecar drops one gist
//! id, and a missing file renders a fixed error fragment. Each cause is logged.
//! Only a content root that can't be read at all fails a request.
//!
//! ## Authentication at the Edge
//!
//! The content modules never see a user. Routes that need one ask the
//! [`auth::Gatekeeper`] injected into the router, which keeps the core
//! testable without sessions or network access.

pub mod auth;
pub mod config;
pub mod highlight;
pub mod logging;
pub mod metadata;
pub mod navigate;
pub mod ordering;
pub mod output;
pub mod pages;
pub mod quiz;
pub mod render;
pub mod server;
pub mod site;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
